//! Rendering of analyses for the terminal

use crate::analysis::HotelAnalysis;
use crate::model::Hotel;
use std::fmt;

/// Width of the score bar, one cell per half point
const BAR_WIDTH: usize = 20;

fn score_line(hotel: &Hotel) -> String {
    match hotel.accessibility_score {
        Some(score) => {
            let filled = ((score.value() / 10.0) * BAR_WIDTH as f64).round() as usize;
            format!(
                "{}/10 ({}) [{}{}]",
                score,
                score.band().label(),
                "#".repeat(filled),
                "-".repeat(BAR_WIDTH - filled.min(BAR_WIDTH))
            )
        }
        None => "not scored".to_string(),
    }
}

/// Multi-line, human-readable report
pub fn render_text(analysis: &HotelAnalysis) -> String {
    Report(analysis).to_string()
}

struct Report<'a>(&'a HotelAnalysis);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.0;
        let hotel = &analysis.hotel;

        writeln!(f, "{}", hotel.name)?;
        writeln!(f, "{}", hotel.location)?;
        writeln!(f, "{}", hotel.url)?;
        writeln!(f, "Hotel ID: {}", hotel.id)?;
        writeln!(f)?;
        writeln!(f, "Accessibility score: {}", score_line(hotel))?;

        writeln!(f)?;
        writeln!(
            f,
            "Accessibility features ({}/{} available)",
            analysis.available_feature_count(),
            analysis.features.len()
        )?;
        if analysis.features.is_empty() {
            writeln!(f, "  (none recorded)")?;
        }
        for feature in &analysis.features {
            let mark = if feature.available { "[x]" } else { "[ ]" };
            match &feature.description {
                Some(desc) => writeln!(f, "  {} {} - {}", mark, feature.name, desc)?,
                None => writeln!(f, "  {} {}", mark, feature.name)?,
            }
        }

        writeln!(f)?;
        writeln!(f, "Compliance notes")?;
        list(f, analysis.compliance.iter().map(|n| n.note.as_str()))?;

        writeln!(f)?;
        writeln!(f, "Guest sentiment")?;
        list(f, analysis.sentiment.iter().map(|i| i.insight.as_str()))
    }
}

/// Bulleted lines, or a placeholder when there are none
fn list<'a>(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = &'a str>) -> fmt::Result {
    let mut empty = true;
    for item in items {
        writeln!(f, "  - {}", item)?;
        empty = false;
    }
    if empty {
        writeln!(f, "  (none recorded)")?;
    }
    Ok(())
}

/// One line per hotel, for listings
pub fn render_hotel_line(hotel: &Hotel) -> String {
    let score = hotel
        .accessibility_score
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<36}  {:<24}  {:<20}  {:>5}  {}",
        hotel.id,
        hotel.name,
        hotel.location,
        score,
        hotel.created_at.format("%Y-%m-%d %H:%M")
    )
}

pub fn render_json(analysis: &HotelAnalysis) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AccessibilityFeature, AccessibilityScore, ComplianceNote, HotelId, RecordId, UserId,
    };
    use chrono::Utc;

    fn analysis(score: Option<f64>) -> HotelAnalysis {
        let hotel_id = HotelId::new();
        HotelAnalysis {
            hotel: Hotel {
                id: hotel_id,
                url: "https://example.com".into(),
                name: "Grand Hotel".into(),
                location: "Paris, France".into(),
                accessibility_score: score.map(|s| AccessibilityScore::new(s).unwrap()),
                created_at: Utc::now(),
                user_id: UserId::from("alice"),
            },
            features: vec![
                AccessibilityFeature {
                    id: RecordId::new(),
                    hotel_id,
                    name: "Wheelchair Access".into(),
                    available: true,
                    description: Some("Ramps".into()),
                    created_at: Utc::now(),
                },
                AccessibilityFeature {
                    id: RecordId::new(),
                    hotel_id,
                    name: "Hearing Loops".into(),
                    available: false,
                    description: None,
                    created_at: Utc::now(),
                },
            ],
            compliance: vec![ComplianceNote {
                id: RecordId::new(),
                hotel_id,
                note: "Meets ADA requirements for entrance accessibility".into(),
                created_at: Utc::now(),
            }],
            sentiment: vec![],
        }
    }

    #[test]
    fn test_text_report() {
        let text = render_text(&analysis(Some(7.5)));
        assert!(text.contains("Grand Hotel"));
        assert!(text.contains("7.5/10 (fair) [###############-----]"));
        assert!(text.contains("(1/2 available)"));
        assert!(text.contains("[x] Wheelchair Access - Ramps"));
        assert!(text.contains("[ ] Hearing Loops\n"));
        assert!(text.contains("  - Meets ADA requirements"));
        assert!(text.contains("Guest sentiment\n  (none recorded)"));
    }

    #[test]
    fn test_unscored_report() {
        let text = render_text(&analysis(None));
        assert!(text.contains("Accessibility score: not scored"));
    }

    #[test]
    fn test_full_score_bar() {
        let text = render_text(&analysis(Some(10.0)));
        let full = format!("10.0/10 (good) [{}]", "#".repeat(BAR_WIDTH));
        assert!(text.contains(&full));
    }

    #[test]
    fn test_empty_report_layout() {
        let mut empty = analysis(None);
        empty.features.clear();
        empty.compliance.clear();

        let expected = format!(
            "Grand Hotel\nParis, France\nhttps://example.com\nHotel ID: {}\n\n\
             Accessibility score: not scored\n\n\
             Accessibility features (0/0 available)\n  (none recorded)\n\n\
             Compliance notes\n  (none recorded)\n\n\
             Guest sentiment\n  (none recorded)\n",
            empty.hotel.id
        );
        assert_eq!(render_text(&empty), expected);
    }

    #[test]
    fn test_json_report_round_trips() {
        let original = analysis(Some(8.0));
        let json = render_json(&original).unwrap();
        let parsed: HotelAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, original);
    }
}
