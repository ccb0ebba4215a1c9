//! Emotion labels and mood resolution
//!
//! The expression backend reports a score per emotion; this module reduces
//! that map to the single mood shown in the UI.

use std::fmt;
use std::str::FromStr;

/// The emotions the presentation layer knows how to style
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Surprised,
    Neutral,
    Disgusted,
    Fearful,
}

impl Emotion {
    /// All known emotions
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Surprised,
        Emotion::Neutral,
        Emotion::Disgusted,
        Emotion::Fearful,
    ];

    /// Lowercase name as reported by expression backends
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Surprised => "surprised",
            Emotion::Neutral => "neutral",
            Emotion::Disgusted => "disgusted",
            Emotion::Fearful => "fearful",
        }
    }

    /// Uppercase display label
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Happy => "HAPPY",
            Emotion::Sad => "SAD",
            Emotion::Angry => "ANGRY",
            Emotion::Surprised => "SURPRISED",
            Emotion::Neutral => "NEUTRAL",
            Emotion::Disgusted => "DISGUSTED",
            Emotion::Fearful => "FEARFUL",
        }
    }
}

impl FromStr for Emotion {
    type Err = String;

    /// Case-insensitive parse of an emotion name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown emotion: {}", s))
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Label shown before the first detection completes
pub const INITIALIZING_LABEL: &str = "INITIALIZING";

/// Sentinel label for a frame without a detectable face
pub const NO_FACE_LABEL: &str = "NO FACE";

/// The mood currently shown to the user
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Mood {
    /// No detection has completed yet
    #[default]
    Initializing,
    /// The last frame had no detectable face
    NoFace,
    /// Winning expression label, uppercased
    Detected(String),
}

impl Mood {
    /// Build a detected mood from a backend label
    ///
    /// A backend label that reads like a sentinel means no face, never a
    /// detected expression.
    pub fn detected(label: &str) -> Self {
        let label = label.trim().to_uppercase();
        if label == NO_FACE_LABEL || label == INITIALIZING_LABEL {
            return Mood::NoFace;
        }
        Mood::Detected(label)
    }

    /// Display label
    pub fn label(&self) -> &str {
        match self {
            Mood::Initializing => INITIALIZING_LABEL,
            Mood::NoFace => NO_FACE_LABEL,
            Mood::Detected(label) => label,
        }
    }

    /// The known emotion behind this mood, if any
    pub fn emotion(&self) -> Option<Emotion> {
        match self {
            Mood::Detected(label) => label.parse().ok(),
            _ => None,
        }
    }

    pub fn is_no_face(&self) -> bool {
        matches!(self, Mood::NoFace)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Expression scores for one detected face
///
/// Insertion order is preserved because tie-breaking depends on it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Expressions {
    scores: Vec<(String, f32)>,
}

impl Expressions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the score for an emotion
    pub fn with(mut self, emotion: impl Into<String>, score: f32) -> Self {
        self.insert(emotion, score);
        self
    }

    /// Add or replace the score for an emotion, keeping its original position
    pub fn insert(&mut self, emotion: impl Into<String>, score: f32) {
        let emotion = emotion.into();
        match self.scores.iter_mut().find(|(name, _)| *name == emotion) {
            Some(entry) => entry.1 = score,
            None => self.scores.push((emotion, score)),
        }
    }

    pub fn get(&self, emotion: &str) -> Option<f32> {
        self.scores
            .iter()
            .find(|(name, _)| name == emotion)
            .map(|(_, score)| *score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.scores.iter().map(|(name, score)| (name.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Entry with the strictly greatest score
    ///
    /// Scanning left to right with a strict `>`, so on a tie the earliest
    /// entry wins. NaN scores never win.
    pub fn dominant(&self) -> Option<(&str, f32)> {
        let mut best: Option<(&str, f32)> = None;
        for (name, score) in self.iter() {
            if score.is_nan() {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((name, score)),
            }
        }
        best
    }
}

impl<S: Into<String>> FromIterator<(S, f32)> for Expressions {
    fn from_iter<I: IntoIterator<Item = (S, f32)>>(iter: I) -> Self {
        let mut expressions = Expressions::new();
        for (name, score) in iter {
            expressions.insert(name, score);
        }
        expressions
    }
}

/// A mood and its confidence, always produced together
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoodReading {
    pub mood: Mood,
    /// Percentage in 0..=100
    pub confidence: u8,
}

impl MoodReading {
    /// Reading for a frame without a face
    pub fn no_face() -> Self {
        Self {
            mood: Mood::NoFace,
            confidence: 0,
        }
    }
}

/// Convert a raw score in [0, 1] to a rounded percentage
pub fn score_to_percent(score: f32) -> u8 {
    if !score.is_finite() {
        return 0;
    }
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Reduce a detection result to the mood shown to the user
///
/// `None` means the backend found no face. An empty score map is treated the
/// same way since there is nothing to rank.
pub fn resolve(detection: Option<&Expressions>) -> MoodReading {
    let Some((emotion, score)) = detection.and_then(Expressions::dominant) else {
        return MoodReading::no_face();
    };

    match Mood::detected(emotion) {
        Mood::NoFace => MoodReading::no_face(),
        mood => MoodReading {
            mood,
            confidence: score_to_percent(score),
        },
    }
}
