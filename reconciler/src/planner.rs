//! Decision function for one reconciliation pass.
//!
//! `plan_pass` looks only at what was observed on the page and at the current
//! state. It does not touch the page or the store, so the same inputs always
//! yield the same plan.

use adsieve_core::{AdRecord, CuratorState, ExtractedAd};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::matching;
use crate::presentation::{affordances_for, placeholder_for, Directive};
use crate::whitelist::SessionWhitelist;

/// What the engine saw for one rendered entry.
#[derive(Debug, Clone)]
pub enum Observation {
    /// A placeholder this engine inserted on an earlier pass.
    Placeholder,
    /// The entry could not be read yet, or is not an ad.
    Unreadable,
    Entry {
        ad: ExtractedAd,
        /// Placeholders tagged with this entry's id right now.
        placeholders: usize,
        affordances_attached: bool,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct StateView<'a> {
    pub state: &'a CuratorState,
    pub whitelist: &'a SessionWhitelist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planned {
    pub directive: Directive,
    /// Set when this entry was auto-hidden by a keyword on this pass.
    pub new_record: Option<AdRecord>,
}

impl Planned {
    fn directive(directive: Directive) -> Self {
        Self {
            directive,
            new_record: None,
        }
    }
}

/// One plan entry per observation, in the same order.
///
/// An id that appears several times in one pass is hidden at most once and
/// gets at most one placeholder.
pub fn plan_pass(
    observations: &[Observation],
    view: StateView<'_>,
    now: DateTime<Utc>,
) -> Vec<Planned> {
    let mut auto_hidden: HashMap<String, AdRecord> = HashMap::new();
    let mut placeholder_counts: HashMap<String, usize> = HashMap::new();

    observations
        .iter()
        .map(|observation| {
            let (ad, observed, affordances_attached) = match observation {
                Observation::Placeholder | Observation::Unreadable => {
                    return Planned::directive(Directive::Skip);
                }
                Observation::Entry {
                    ad,
                    placeholders,
                    affordances_attached,
                } => (ad, *placeholders, *affordances_attached),
            };

            let placeholders = placeholder_counts.entry(ad.id.clone()).or_insert(observed);

            let existing = view
                .state
                .hidden_record(&ad.id)
                .or_else(|| auto_hidden.get(&ad.id));
            if let Some(record) = existing {
                return Planned::directive(suppress(ad, record.keyword_label(), placeholders));
            }

            if !view.whitelist.contains(&ad.id) {
                if let Some(keyword) = matching::matches(ad, &view.state.keywords) {
                    let record = AdRecord::by_keyword(ad, keyword, now);
                    auto_hidden.insert(ad.id.clone(), record.clone());
                    return Planned {
                        directive: suppress(ad, Some(keyword.as_str()), placeholders),
                        new_record: Some(record),
                    };
                }
            }

            let remove_stale_placeholders = *placeholders > 0;
            *placeholders = 0;
            let affordances = if affordances_attached {
                None
            } else {
                Some(affordances_for(ad, view.state.is_contacted(&ad.id)))
            };
            Planned::directive(Directive::Show {
                id: ad.id.clone(),
                remove_stale_placeholders,
                affordances,
            })
        })
        .collect()
}

/// Suppress `ad`, leaving exactly one placeholder for its id. `placeholders`
/// is the count for the id as of this point in the pass and is updated.
fn suppress(ad: &ExtractedAd, keyword: Option<&str>, placeholders: &mut usize) -> Directive {
    let (placeholder, replace_existing) = match *placeholders {
        1 => (None, false),
        count => (Some(placeholder_for(ad, keyword)), count > 1),
    };
    *placeholders = 1;
    Directive::Suppress {
        id: ad.id.clone(),
        placeholder,
        replace_existing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsieve_core::{ContactRecord, HiddenBy, Keyword};

    fn ad(id: &str, title: &str) -> ExtractedAd {
        ExtractedAd {
            id: id.to_string(),
            title: title.to_string(),
            price: "5 €".to_string(),
            location: "Köln".to_string(),
            ..Default::default()
        }
    }

    fn seen(ad: ExtractedAd) -> Observation {
        Observation::Entry {
            ad,
            placeholders: 0,
            affordances_attached: false,
        }
    }

    fn state_with_keywords(raw: &[&str]) -> CuratorState {
        CuratorState {
            keywords: raw.iter().filter_map(|k| Keyword::parse(k)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_placeholders_and_unreadable_entries_are_skipped() {
        let state = CuratorState::default();
        let whitelist = SessionWhitelist::new();
        let plan = plan_pass(
            &[
                Observation::Placeholder,
                Observation::Unreadable,
            ],
            StateView {
                state: &state,
                whitelist: &whitelist,
            },
            Utc::now(),
        );
        assert!(plan.iter().all(|p| p.directive == Directive::Skip));
    }

    #[test]
    fn test_visible_entry_gets_affordances_once() {
        let mut state = CuratorState::default();
        state.contacted.push(ContactRecord {
            id: "1".to_string(),
            contacted_at: Utc::now(),
        });
        let whitelist = SessionWhitelist::new();
        let view = StateView {
            state: &state,
            whitelist: &whitelist,
        };

        let plan = plan_pass(&[seen(ad("1", "Lamp"))], view, Utc::now());
        match &plan[0].directive {
            Directive::Show {
                affordances: Some(affordances),
                remove_stale_placeholders: false,
                ..
            } => assert!(affordances.contacted),
            other => panic!("unexpected directive {:?}", other),
        }

        let already = Observation::Entry {
            ad: ad("1", "Lamp"),
            placeholders: 0,
            affordances_attached: true,
        };
        let plan = plan_pass(&[already], view, Utc::now());
        assert!(matches!(
            plan[0].directive,
            Directive::Show {
                affordances: None,
                ..
            }
        ));
    }

    #[test]
    fn test_keyword_hit_creates_record_and_decorated_placeholder() {
        let state = state_with_keywords(&["foo", "bar"]);
        let whitelist = SessionWhitelist::new();
        let plan = plan_pass(
            &[seen(ad("7", "Bar with Foo"))],
            StateView {
                state: &state,
                whitelist: &whitelist,
            },
            Utc::now(),
        );

        let record = plan[0].new_record.as_ref().unwrap();
        assert_eq!(record.hidden_by, HiddenBy::Keyword);
        assert_eq!(record.matched_keyword.as_deref(), Some("foo"));
        match &plan[0].directive {
            Directive::Suppress {
                placeholder: Some(placeholder),
                ..
            } => {
                assert_eq!(placeholder.title, "Bar with Foo (foo)");
                assert_eq!(placeholder.meta, "5 € • Köln");
            }
            other => panic!("unexpected directive {:?}", other),
        }
    }

    #[test]
    fn test_whitelisted_entry_is_not_auto_hidden() {
        let state = state_with_keywords(&["lamp"]);
        let mut whitelist = SessionWhitelist::new();
        whitelist.add("1");
        let plan = plan_pass(
            &[seen(ad("1", "Lamp"))],
            StateView {
                state: &state,
                whitelist: &whitelist,
            },
            Utc::now(),
        );
        assert!(plan[0].new_record.is_none());
        assert!(matches!(plan[0].directive, Directive::Show { .. }));
    }

    #[test]
    fn test_hidden_entry_with_existing_placeholder_is_only_suppressed() {
        let mut state = CuratorState::default();
        state.hidden.push(AdRecord::manual(&ad("1", "Lamp"), Utc::now()));
        let whitelist = SessionWhitelist::new();
        let observation = Observation::Entry {
            ad: ad("1", "Lamp"),
            placeholders: 1,
            affordances_attached: true,
        };
        let plan = plan_pass(
            &[observation],
            StateView {
                state: &state,
                whitelist: &whitelist,
            },
            Utc::now(),
        );
        assert_eq!(
            plan[0].directive,
            Directive::Suppress {
                id: "1".to_string(),
                placeholder: None,
                replace_existing: false,
            }
        );
    }

    #[test]
    fn test_repeated_id_in_one_pass_is_hidden_once() {
        let state = state_with_keywords(&["lamp"]);
        let whitelist = SessionWhitelist::new();
        let plan = plan_pass(
            &[seen(ad("1", "Lamp")), seen(ad("1", "Lamp"))],
            StateView {
                state: &state,
                whitelist: &whitelist,
            },
            Utc::now(),
        );

        assert!(plan[0].new_record.is_some());
        assert!(plan[1].new_record.is_none());
        let placeholders = plan
            .iter()
            .filter(|p| {
                matches!(
                    p.directive,
                    Directive::Suppress {
                        placeholder: Some(_),
                        ..
                    }
                )
            })
            .count();
        assert_eq!(placeholders, 1);
    }

    #[test]
    fn test_surplus_placeholders_are_collapsed_to_one() {
        let mut state = state_with_keywords(&["lamp"]);
        state.hidden.push(AdRecord::manual(&ad("1", "Desk"), Utc::now()));
        let whitelist = SessionWhitelist::new();
        let plan = plan_pass(
            &[
                Observation::Entry {
                    ad: ad("1", "Desk"),
                    placeholders: 3,
                    affordances_attached: false,
                },
                Observation::Entry {
                    ad: ad("2", "Lamp"),
                    placeholders: 2,
                    affordances_attached: false,
                },
                seen(ad("2", "Lamp")),
            ],
            StateView {
                state: &state,
                whitelist: &whitelist,
            },
            Utc::now(),
        );

        for planned in &plan[..2] {
            match &planned.directive {
                Directive::Suppress {
                    placeholder: Some(_),
                    replace_existing: true,
                    ..
                } => {}
                other => panic!("unexpected directive {:?}", other),
            }
        }
        assert!(matches!(
            plan[2].directive,
            Directive::Suppress {
                placeholder: None,
                replace_existing: false,
                ..
            }
        ));
    }

    #[test]
    fn test_stale_placeholder_is_removed_for_visible_entry() {
        let state = CuratorState::default();
        let whitelist = SessionWhitelist::new();
        let observation = Observation::Entry {
            ad: ad("1", "Lamp"),
            placeholders: 2,
            affordances_attached: false,
        };
        let plan = plan_pass(
            &[observation],
            StateView {
                state: &state,
                whitelist: &whitelist,
            },
            Utc::now(),
        );
        assert!(matches!(
            plan[0].directive,
            Directive::Show {
                remove_stale_placeholders: true,
                ..
            }
        ));
    }
}
