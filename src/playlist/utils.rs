use chrono::{Datelike, Local, Weekday};

use super::{MoodDimension, MoodVector};

/// Helper trait for string formatting
pub trait ToTitleCase {
    fn to_title_case(&self) -> String;
}

impl ToTitleCase for str {
    fn to_title_case(&self) -> String {
        self.split_whitespace()
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => {
                        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                    }
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Playlist naming utilities
pub struct PlaylistNaming;

impl PlaylistNaming {
    /// Generate a name from the dominant mood and today's weekday
    pub fn generate_playlist_name(base: &str, mood: &MoodVector) -> String {
        Self::name_for_day(base, mood, Local::now().weekday())
    }

    pub fn name_for_day(base: &str, mood: &MoodVector, day: Weekday) -> String {
        let dominant = mood.dominant();
        let suffix = match dominant {
            MoodDimension::Happy => "vibes",
            MoodDimension::Sad => "blues",
            MoodDimension::Energetic => "beats",
            MoodDimension::Calm => "tunes",
            MoodDimension::Intense => "grooves",
        };
        format!("{} {} {} {}", base, weekday_name(day), dominant.as_str(), suffix).to_title_case()
    }

    /// Readable mood breakdown, heaviest dimension first
    pub fn describe_mood(mood: &MoodVector) -> String {
        let mut parts: Vec<(MoodDimension, f32)> = mood.iter().collect();
        parts.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        let breakdown = parts
            .iter()
            .map(|(dimension, weight)| format!("{} {:.0}%", dimension, weight * 100.0))
            .collect::<Vec<_>>()
            .join(", ");
        format!("Mood: {breakdown}")
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}
