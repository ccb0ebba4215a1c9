//! Mood → (icon, color) mapping
//!
//! Matches on the uppercase label, so anything the table does not know
//! (`NO FACE`, `INITIALIZING`, labels a backend invents) gets the default.

use crate::mood::{Emotion, Mood};
use egui::Color32;

/// Icon and accent color for a mood
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoodStyle {
    pub icon: &'static str,
    pub color: Color32,
}

impl MoodStyle {
    pub const DEFAULT: MoodStyle = MoodStyle {
        icon: "🔍",
        color: Color32::WHITE,
    };

    pub fn for_emotion(emotion: Emotion) -> Self {
        let (icon, color) = match emotion {
            Emotion::Happy => ("😊", Color32::from_rgb(250, 204, 21)), // yellow-400
            Emotion::Sad => ("😔", Color32::from_rgb(96, 165, 250)),   // blue-400
            Emotion::Angry => ("😠", Color32::from_rgb(248, 113, 113)), // red-400
            Emotion::Surprised => ("😲", Color32::from_rgb(192, 132, 252)), // purple-400
            Emotion::Neutral => ("😐", Color32::from_rgb(203, 213, 225)), // slate-300
            Emotion::Disgusted => ("🤢", Color32::from_rgb(74, 222, 128)), // green-400
            Emotion::Fearful => ("😨", Color32::from_rgb(129, 140, 248)), // indigo-400
        };
        Self { icon, color }
    }

    pub fn for_label(label: &str) -> Self {
        Emotion::ALL
            .iter()
            .find(|emotion| emotion.label() == label)
            .map_or(Self::DEFAULT, |emotion| Self::for_emotion(*emotion))
    }

    pub fn for_mood(mood: &Mood) -> Self {
        Self::for_label(mood.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_emotion_has_its_own_style() {
        let styles: Vec<MoodStyle> = Emotion::ALL
            .iter()
            .map(|e| MoodStyle::for_label(e.label()))
            .collect();

        for (i, style) in styles.iter().enumerate() {
            assert_ne!(*style, MoodStyle::DEFAULT);
            for other in &styles[i + 1..] {
                assert_ne!(style.icon, other.icon);
            }
        }
    }

    #[test]
    fn test_known_labels() {
        assert_eq!(MoodStyle::for_label("HAPPY").icon, "😊");
        assert_eq!(
            MoodStyle::for_label("HAPPY").color,
            Color32::from_rgb(250, 204, 21)
        );
        assert_eq!(MoodStyle::for_label("SAD").icon, "😔");
        assert_eq!(MoodStyle::for_label("FEARFUL").icon, "😨");
    }

    #[test]
    fn test_fallbacks() {
        assert_eq!(MoodStyle::for_label("NO FACE"), MoodStyle::DEFAULT);
        assert_eq!(MoodStyle::for_label("INITIALIZING"), MoodStyle::DEFAULT);
        assert_eq!(MoodStyle::for_label("CONTEMPT"), MoodStyle::DEFAULT);
        // Matched as-is
        assert_eq!(MoodStyle::for_label("happy"), MoodStyle::DEFAULT);
        assert_eq!(MoodStyle::for_mood(&Mood::Initializing), MoodStyle::DEFAULT);
    }

    #[test]
    fn test_mapping_is_stable() {
        let mood = Mood::detected("angry");
        assert_eq!(MoodStyle::for_mood(&mood), MoodStyle::for_mood(&mood));
        assert_eq!(MoodStyle::for_mood(&mood).icon, "😠");
    }
}
