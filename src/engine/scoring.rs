//! Deterministic lead scoring.
//!
//! The score is the sum of five weighted signals clamped to `0..=100`. Zip tiers and
//! source weights are passed in so tenants can tune them without code changes.

use crate::errors::AppError;
use crate::models::{BantFlags, LeadProfile, SourceWeights, Urgency, ZipTiers};

pub const MAX_SCORE: u8 = 100;

const PREMIUM_ZIP_POINTS: u32 = 10;
const TARGET_ZIP_POINTS: u32 = 7;
const OTHER_ZIP_POINTS: u32 = 3;

/// Points for the property value tier. Unknown values fall into the lowest tier.
pub fn property_value_points(value: Option<f64>) -> u32 {
    match value {
        Some(v) if v >= 500_000.0 => 30,
        Some(v) if v >= 300_000.0 => 20,
        Some(v) if v >= 200_000.0 => 10,
        _ => 5,
    }
}

pub fn location_points(zip: &str, tiers: &ZipTiers) -> u32 {
    let zip = zip.trim();
    if tiers.premium.contains(zip) {
        PREMIUM_ZIP_POINTS
    } else if tiers.target.contains(zip) {
        TARGET_ZIP_POINTS
    } else {
        OTHER_ZIP_POINTS
    }
}

pub fn source_points(source: Option<&str>, weights: &SourceWeights) -> u32 {
    let weight = source
        .map(normalize_key)
        .and_then(|key| weights.weights.get(&key).copied())
        .unwrap_or(weights.default_weight);
    u32::from(weight)
}

pub fn urgency_points(urgency: Urgency) -> u32 {
    match urgency {
        Urgency::Immediate => 5,
        Urgency::WithinOneWeek => 3,
        Urgency::WithinOneMonth => 2,
        Urgency::Planning => 1,
    }
}

pub fn bant_points(bant: &BantFlags) -> u32 {
    [
        (bant.budget_confirmed, 3),
        (bant.decision_maker, 3),
        (bant.need_identified, 2),
        (bant.timeline_defined, 2),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .map(|(_, points)| points)
    .sum()
}

/// Lower-case, trim, and turn spaces and hyphens into underscores.
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Reject tables that would silently produce a wrong score.
pub fn check_tables(zip_tiers: &ZipTiers, source_weights: &SourceWeights) -> Result<(), AppError> {
    if let Some(zip) = zip_tiers.premium.intersection(&zip_tiers.target).next() {
        return Err(AppError::Configuration(format!(
            "Zip {} is listed in both premium and target tiers",
            zip
        )));
    }
    if zip_tiers
        .premium
        .iter()
        .chain(zip_tiers.target.iter())
        .any(|zip| zip.trim().is_empty() || zip.trim() != zip)
    {
        return Err(AppError::Configuration(
            "Zip tiers must not contain blank or padded entries".to_string(),
        ));
    }
    for (source, weight) in &source_weights.weights {
        if source.trim().is_empty() || normalize_key(source) != *source {
            return Err(AppError::Configuration(format!(
                "Source weight key {:?} is not a normalized source name",
                source
            )));
        }
        if *weight > MAX_SCORE {
            return Err(AppError::Configuration(format!(
                "Source weight for {} exceeds {}",
                source, MAX_SCORE
            )));
        }
    }
    if source_weights.default_weight > MAX_SCORE {
        return Err(AppError::Configuration(format!(
            "Default source weight exceeds {}",
            MAX_SCORE
        )));
    }
    Ok(())
}

/// Score a lead profile.
pub fn score(
    profile: &LeadProfile,
    zip_tiers: &ZipTiers,
    source_weights: &SourceWeights,
) -> Result<u8, AppError> {
    check_tables(zip_tiers, source_weights)?;

    let total = property_value_points(profile.property_value)
        + location_points(&profile.zip, zip_tiers)
        + source_points(profile.source.as_deref(), source_weights)
        + urgency_points(profile.urgency)
        + bant_points(&profile.bant);

    Ok(total.min(u32::from(MAX_SCORE)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> ZipTiers {
        ZipTiers {
            premium: ["78701".to_string()].into_iter().collect(),
            target: ["78745".to_string()].into_iter().collect(),
        }
    }

    fn all_bant() -> BantFlags {
        BantFlags {
            budget_confirmed: true,
            decision_maker: true,
            need_identified: true,
            timeline_defined: true,
        }
    }

    #[test]
    fn test_high_value_premium_referral() {
        let profile = LeadProfile {
            property_value: Some(550_000.0),
            zip: "78701".to_string(),
            source: Some("referral".to_string()),
            urgency: Urgency::Immediate,
            bant: all_bant(),
        };
        assert_eq!(score(&profile, &tiers(), &SourceWeights::default()).unwrap(), 68);
    }

    #[test]
    fn test_unknown_value_door_to_door() {
        let profile = LeadProfile {
            property_value: None,
            zip: "10001".to_string(),
            source: Some("door_to_door".to_string()),
            urgency: Urgency::Planning,
            bant: BantFlags::default(),
        };
        assert_eq!(score(&profile, &tiers(), &SourceWeights::default()).unwrap(), 15);
    }

    #[test]
    fn test_property_value_tiers() {
        assert_eq!(property_value_points(Some(500_000.0)), 30);
        assert_eq!(property_value_points(Some(499_999.0)), 20);
        assert_eq!(property_value_points(Some(300_000.0)), 20);
        assert_eq!(property_value_points(Some(200_000.0)), 10);
        assert_eq!(property_value_points(Some(199_999.0)), 5);
        assert_eq!(property_value_points(None), 5);
    }

    #[test]
    fn test_source_lookup_normalizes_and_defaults() {
        let weights = SourceWeights::default();
        assert_eq!(source_points(Some("Google Ads"), &weights), 12);
        assert_eq!(source_points(Some("door-to-door"), &weights), 6);
        assert_eq!(source_points(Some("yard_sign"), &weights), 8);
        assert_eq!(source_points(None, &weights), 8);
    }

    #[test]
    fn test_target_zip_and_bant_partial() {
        assert_eq!(location_points(" 78745 ", &tiers()), 7);
        let bant = BantFlags {
            decision_maker: true,
            timeline_defined: true,
            ..BantFlags::default()
        };
        assert_eq!(bant_points(&bant), 5);
        assert_eq!(bant_points(&all_bant()), 10);
    }

    #[test]
    fn test_score_clamped_with_heavy_weights() {
        let mut weights = SourceWeights::default();
        weights.weights.insert("referral".to_string(), 100);
        let profile = LeadProfile {
            property_value: Some(900_000.0),
            zip: "78701".to_string(),
            source: Some("referral".to_string()),
            urgency: Urgency::Immediate,
            bant: all_bant(),
        };
        assert_eq!(score(&profile, &tiers(), &weights).unwrap(), MAX_SCORE);
    }

    #[test]
    fn test_score_is_deterministic_and_bounded() {
        let weights = SourceWeights::default();
        for value in [None, Some(0.0), Some(250_000.0), Some(2_000_000.0)] {
            for urgency in [Urgency::Immediate, Urgency::Planning] {
                let profile = LeadProfile {
                    property_value: value,
                    zip: "78701".to_string(),
                    source: Some("facebook_ads".to_string()),
                    urgency,
                    bant: all_bant(),
                };
                let first = score(&profile, &tiers(), &weights).unwrap();
                let second = score(&profile, &tiers(), &weights).unwrap();
                assert_eq!(first, second);
                assert!(first <= MAX_SCORE);
            }
        }
    }

    #[test]
    fn test_overlapping_zip_tiers_rejected() {
        let mut tiers = tiers();
        tiers.target.insert("78701".to_string());
        let err = score(&LeadProfile::default(), &tiers, &SourceWeights::default()).unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_unnormalized_source_key_rejected() {
        let mut weights = SourceWeights::default();
        weights.weights.insert("Google Ads".to_string(), 12);
        assert!(check_tables(&tiers(), &weights).is_err());

        let mut weights = SourceWeights::default();
        weights.default_weight = 101;
        assert!(check_tables(&tiers(), &weights).is_err());
    }
}
