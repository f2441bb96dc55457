//! Auto-assignment strategy selection.
//!
//! Pure over a roster snapshot, the persisted rotation cursor and the wall-clock time.
//! Applying the decision (workload counters, lead write) is the repository's job.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::{AssignmentSettings, AssignmentStrategy, Lead, TeamMember};

use super::scoring::normalize_key;

/// Why a lead was left without an owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    NoTerritoryMatch,
    NoSkillMatch,
    NoCapacity,
}

impl UnassignedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnassignedReason::NoTerritoryMatch => "no_territory_match",
            UnassignedReason::NoSkillMatch => "no_skill_match",
            UnassignedReason::NoCapacity => "no_capacity",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentDecision {
    Assigned {
        #[serde(rename = "memberId")]
        member_id: String,
        reason: String,
    },
    Unassigned {
        reason: UnassignedReason,
    },
}

impl AssignmentDecision {
    fn assigned(member: &TeamMember, reason: &str) -> Self {
        AssignmentDecision::Assigned {
            member_id: member.id.clone(),
            reason: reason.to_string(),
        }
    }

    pub fn member_id(&self) -> Option<&str> {
        match self {
            AssignmentDecision::Assigned { member_id, .. } => Some(member_id),
            AssignmentDecision::Unassigned { .. } => None,
        }
    }
}

/// Active, available, inside working hours and under capacity.
pub fn is_eligible(member: &TeamMember, now: NaiveTime) -> bool {
    member.active && member.available && member.in_hours(now) && member.has_capacity()
}

/// Exact match, or prefix match when the tag ends in `*`.
pub fn territory_matches(tag: &str, zip: &str) -> bool {
    let tag = tag.trim();
    let zip = zip.trim();
    if zip.is_empty() {
        return false;
    }
    match tag.strip_suffix('*') {
        Some(prefix) => !prefix.is_empty() && zip.starts_with(prefix),
        None => tag.eq_ignore_ascii_case(zip),
    }
}

fn rotate<'a>(members: &[&'a TeamMember], cursor: u64) -> &'a TeamMember {
    let index = (cursor % members.len() as u64) as usize;
    members[index]
}

/// Choose an owner for `lead`. `cursor` is the rotation position for this call.
pub fn select_member(
    lead: &Lead,
    roster: &[TeamMember],
    settings: &AssignmentSettings,
    cursor: u64,
    now: NaiveTime,
) -> AssignmentDecision {
    let mut eligible: Vec<&TeamMember> = roster.iter().filter(|m| is_eligible(m, now)).collect();
    if eligible.is_empty() {
        return AssignmentDecision::Unassigned {
            reason: UnassignedReason::NoCapacity,
        };
    }
    eligible.sort_by(|a, b| a.id.cmp(&b.id));

    match settings.strategy {
        AssignmentStrategy::RoundRobin => {
            AssignmentDecision::assigned(rotate(&eligible, cursor), "round_robin")
        }
        AssignmentStrategy::Territory => {
            let matched: Vec<&TeamMember> = eligible
                .iter()
                .copied()
                .filter(|m| m.territories.iter().any(|t| territory_matches(t, &lead.zip)))
                .collect();
            if !matched.is_empty() {
                AssignmentDecision::assigned(rotate(&matched, cursor), "territory_match")
            } else if settings.territory_fallback {
                AssignmentDecision::assigned(rotate(&eligible, cursor), "territory_fallback")
            } else {
                AssignmentDecision::Unassigned {
                    reason: UnassignedReason::NoTerritoryMatch,
                }
            }
        }
        AssignmentStrategy::SkillBased => {
            let required = normalize_key(&lead.project_type);
            let skilled: Vec<&TeamMember> = eligible
                .iter()
                .copied()
                .filter(|m| m.skills.iter().any(|s| normalize_key(s) == required))
                .collect();
            let Some(lowest) = skilled.iter().map(|m| m.workload).min() else {
                return AssignmentDecision::Unassigned {
                    reason: UnassignedReason::NoSkillMatch,
                };
            };
            let tied: Vec<&TeamMember> = skilled
                .into_iter()
                .filter(|m| m.workload == lowest)
                .collect();
            AssignmentDecision::assigned(rotate(&tied, cursor), "skill_match")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::models::{BantFlags, LeadStatus, Temperature, Urgency, WorkingHours};

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    fn member(id: &str) -> TeamMember {
        TeamMember {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            email: None,
            active: true,
            available: true,
            territories: Vec::new(),
            skills: Vec::new(),
            working_hours: None,
            max_active_leads: None,
            workload: 0,
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            version: 1,
        }
    }

    fn lead(zip: &str, project_type: &str) -> Lead {
        Lead {
            id: "lead-1".to_string(),
            first_name: "Lee".to_string(),
            last_name: "Hart".to_string(),
            phone: "5550001111".to_string(),
            email: None,
            address: "1 Main St".to_string(),
            zip: zip.to_string(),
            property_value: None,
            roof_age: None,
            roof_type: None,
            project_type: project_type.to_string(),
            urgency: Urgency::Planning,
            source: None,
            budget_min: None,
            budget_max: None,
            bant: BantFlags::default(),
            score: 15,
            temperature: Temperature::Cold,
            status: LeadStatus::New,
            assigned_to: None,
            notes: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
            version: 1,
        }
    }

    fn settings(strategy: AssignmentStrategy) -> AssignmentSettings {
        AssignmentSettings {
            strategy,
            ..AssignmentSettings::default()
        }
    }

    #[test]
    fn test_round_robin_fairness() {
        let roster = vec![member("c"), member("a"), member("b")];
        let lead = lead("30301", "gutters");
        let mut counts: HashMap<String, usize> = HashMap::new();
        for cursor in 0..3 {
            let decision = select_member(
                &lead,
                &roster,
                &settings(AssignmentStrategy::RoundRobin),
                cursor,
                noon(),
            );
            *counts.entry(decision.member_id().unwrap().to_string()).or_default() += 1;
        }
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|n| *n == 1));
    }

    #[test]
    fn test_unavailable_and_out_of_hours_filtered() {
        let mut away = member("a");
        away.available = false;
        let mut night_shift = member("b");
        night_shift.working_hours = Some(WorkingHours {
            start: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        });
        let mut full = member("c");
        full.max_active_leads = Some(2);
        full.workload = 2;
        let roster = vec![away, night_shift, full, member("d")];

        for cursor in 0..4 {
            let decision = select_member(
                &lead("30301", "gutters"),
                &roster,
                &settings(AssignmentStrategy::RoundRobin),
                cursor,
                noon(),
            );
            assert_eq!(decision.member_id(), Some("d"));
        }
    }

    #[test]
    fn test_no_eligible_member_is_no_capacity() {
        let mut inactive = member("a");
        inactive.active = false;
        let decision = select_member(
            &lead("30301", "gutters"),
            &[inactive],
            &settings(AssignmentStrategy::Territory),
            0,
            noon(),
        );
        assert_eq!(
            decision,
            AssignmentDecision::Unassigned {
                reason: UnassignedReason::NoCapacity
            }
        );
    }

    #[test]
    fn test_territory_prefix_match_wins() {
        let mut east = member("east");
        east.territories = vec!["303*".to_string()];
        let mut west = member("west");
        west.territories = vec!["90210".to_string()];
        let roster = vec![east, west];

        for cursor in 0..3 {
            let decision = select_member(
                &lead("30318", "gutters"),
                &roster,
                &settings(AssignmentStrategy::Territory),
                cursor,
                noon(),
            );
            assert_eq!(
                decision,
                AssignmentDecision::Assigned {
                    member_id: "east".to_string(),
                    reason: "territory_match".to_string()
                }
            );
        }
    }

    #[test]
    fn test_territory_fallback_and_strict_no_match() {
        let mut west = member("west");
        west.territories = vec!["902*".to_string()];
        let roster = vec![west];

        let decision = select_member(
            &lead("30318", "gutters"),
            &roster,
            &settings(AssignmentStrategy::Territory),
            5,
            noon(),
        );
        assert_eq!(decision.member_id(), Some("west"));

        let no_fallback = AssignmentSettings {
            strategy: AssignmentStrategy::Territory,
            territory_fallback: false,
            auto_assign_on_intake: false,
        };
        let decision = select_member(&lead("30318", "gutters"), &roster, &no_fallback, 5, noon());
        assert_eq!(
            decision,
            AssignmentDecision::Unassigned {
                reason: UnassignedReason::NoTerritoryMatch
            }
        );
    }

    #[test]
    fn test_skill_based_prefers_lowest_workload() {
        let mut busy = member("a");
        busy.skills = vec!["Roof Replacement".to_string()];
        busy.workload = 4;
        let mut light = member("b");
        light.skills = vec!["roof_replacement".to_string()];
        light.workload = 1;
        let mut unskilled = member("c");
        unskilled.skills = vec!["siding".to_string()];

        let decision = select_member(
            &lead("30301", "roof_replacement"),
            &[busy, light, unskilled],
            &settings(AssignmentStrategy::SkillBased),
            0,
            noon(),
        );
        assert_eq!(decision.member_id(), Some("b"));
    }

    #[test]
    fn test_skill_ties_rotate_by_cursor() {
        let mut a = member("a");
        a.skills = vec!["siding".to_string()];
        let mut b = member("b");
        b.skills = vec!["siding".to_string()];
        let roster = vec![a, b];
        let strategy = settings(AssignmentStrategy::SkillBased);

        let first = select_member(&lead("1", "siding"), &roster, &strategy, 0, noon());
        let second = select_member(&lead("1", "siding"), &roster, &strategy, 1, noon());
        assert_eq!(first.member_id(), Some("a"));
        assert_eq!(second.member_id(), Some("b"));
    }

    #[test]
    fn test_no_skill_match() {
        let decision = select_member(
            &lead("30301", "solar"),
            &[member("a")],
            &settings(AssignmentStrategy::SkillBased),
            0,
            noon(),
        );
        assert_eq!(
            decision,
            AssignmentDecision::Unassigned {
                reason: UnassignedReason::NoSkillMatch
            }
        );
    }

    #[test]
    fn test_territory_matches() {
        assert!(territory_matches("303*", "30301"));
        assert!(territory_matches(" 30301 ", "30301"));
        assert!(!territory_matches("*", "30301"));
        assert!(!territory_matches("303*", ""));
        assert!(!territory_matches("30302", "30301"));
    }
}
