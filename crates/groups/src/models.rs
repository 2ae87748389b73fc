use ledger::{LedgerError, MAX_ROSTER_SIZE, Money, Roster};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use validator::Validate;

pub const PASTEL_COLORS: [&str; 12] = [
    "#FFB3BA", "#FFDFBA", "#FFFFBA", "#BAFFC9", "#BAE1FF", "#E2F0CB",
    "#FFD1DC", "#D4F0F0", "#B6CFB6", "#FCB7AF", "#D5AAFF", "#85E3FF",
];

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Participant {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub participants: Vec<Participant>, // Owner is implicit, never stored here
    pub created_at: String,
    pub updated_at: String,
}

impl Group {
    pub fn participant_names(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.name.clone()).collect()
    }

    pub fn roster(&self, owner: &str) -> Result<Roster, LedgerError> {
        Roster::new(owner, self.participant_names())
    }
}

/// A group together with its spending totals.
#[derive(Debug, Serialize)]
pub struct GroupDetail {
    #[serde(flatten)]
    pub group: Group,
    pub total_spent: Money,
    pub expense_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RawParticipant {
    #[validate(length(min = 1, max = 60, message = "Participant name must be 1-60 characters"))]
    pub name: String,
    #[validate(length(equal = 7, message = "Color must look like #RRGGBB"))]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RawCreateGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Group name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    pub participants: Vec<RawParticipant>,
}

#[derive(Debug, Deserialize)]
pub struct RawUpdateGroupRequest {
    pub name: Option<String>,
    pub participants: Option<Vec<RawParticipant>>,
}

/// A validated group definition. Once built, the name is non-empty and the
/// roster holds at most three distinct names.
#[derive(Debug, Serialize)]
pub struct GroupRequest {
    name: String,
    participants: Vec<Participant>,
}

impl GroupRequest {
    pub fn new(
        name: String,
        participants: Vec<RawParticipant>,
        pick_color: impl Fn() -> String,
    ) -> Result<Self, String> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err("Group name is required".to_string());
        }

        if participants.len() > MAX_ROSTER_SIZE {
            return Err(format!(
                "Maximum {} participants allowed (plus the owner)",
                MAX_ROSTER_SIZE
            ));
        }

        let mut seen = HashSet::new();
        let mut roster = Vec::with_capacity(participants.len());
        for raw in participants {
            raw.validate().map_err(|e| e.to_string())?;
            let participant_name = raw.name.trim().to_string();
            if participant_name.is_empty() {
                return Err("Participant name cannot be empty".to_string());
            }
            if !seen.insert(participant_name.clone()) {
                return Err(format!("Participant '{}' is listed twice", participant_name));
            }
            roster.push(Participant {
                name: participant_name,
                color: raw.color.unwrap_or_else(&pick_color),
            });
        }

        Ok(Self { name, participants: roster })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, color: Option<&str>) -> RawParticipant {
        RawParticipant {
            name: name.to_string(),
            color: color.map(str::to_string),
        }
    }

    fn grey() -> String {
        "#CCCCCC".to_string()
    }

    #[test]
    fn test_group_request_trims_and_fills_colors() {
        let req = GroupRequest::new(
            "  Trip  ".into(),
            vec![raw(" Alice ", Some("#FFB3BA")), raw("Bob", None)],
            grey,
        )
        .unwrap();
        assert_eq!(req.name(), "Trip");
        assert_eq!(req.participants()[0].name, "Alice");
        assert_eq!(req.participants()[1].color, "#CCCCCC");
    }

    #[test]
    fn test_group_request_empty_name() {
        assert!(GroupRequest::new("   ".into(), vec![], grey).is_err());
    }

    #[test]
    fn test_group_request_too_many_participants() {
        let people = vec![raw("A", None), raw("B", None), raw("C", None), raw("D", None)];
        let err = GroupRequest::new("Flat".into(), people, grey).unwrap_err();
        assert!(err.contains("Maximum 3"));
    }

    #[test]
    fn test_group_request_duplicate_names() {
        let people = vec![raw("A", None), raw(" A", None)];
        assert!(GroupRequest::new("Flat".into(), people, grey).is_err());
    }

    #[test]
    fn test_group_request_bad_color() {
        let people = vec![raw("A", Some("blue"))];
        assert!(GroupRequest::new("Flat".into(), people, grey).is_err());
    }

    #[test]
    fn test_raw_create_validates_name_length() {
        let raw = RawCreateGroupRequest {
            name: String::new(),
            participants: vec![],
        };
        assert!(raw.validate().is_err());
    }

    #[test]
    fn test_group_roster() {
        let group = Group {
            id: 1,
            name: "Trip".into(),
            participants: vec![Participant { name: "A".into(), color: grey() }],
            created_at: String::new(),
            updated_at: String::new(),
        };
        let roster = group.roster("Me").unwrap();
        assert_eq!(roster.members(), vec!["A".to_string(), "Me".to_string()]);
    }
}
