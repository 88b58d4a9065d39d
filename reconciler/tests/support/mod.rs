//! In-memory stand-in for a rendered listing page.

#![allow(dead_code)]

use adsieve_core::{ExtractedAd, ExtractionError};
use reconciler::{Affordances, Directive, ExtractionAdapter, PresentationSink};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("reconciler=debug,state_store=debug")
        .try_init();
}

#[derive(Debug, Clone)]
pub enum SlotKind {
    Ad {
        read: Result<ExtractedAd, ExtractionError>,
        hidden: bool,
        affordances: Option<Affordances>,
    },
    Banner,
    Placeholder {
        id: String,
        title: String,
    },
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub key: u64,
    pub kind: SlotKind,
}

#[derive(Debug, Default)]
pub struct Page {
    pub slots: Vec<Slot>,
    next_key: u64,
    pub attach_calls: usize,
    pub contacted: HashMap<String, bool>,
    pub applied: Vec<Directive>,
}

impl Page {
    fn push(&mut self, kind: SlotKind) -> u64 {
        let key = self.next_key;
        self.next_key += 1;
        self.slots.push(Slot { key, kind });
        key
    }

    fn position(&self, key: u64) -> Option<usize> {
        self.slots.iter().position(|slot| slot.key == key)
    }

    fn remove_placeholders(&mut self, id: &str) -> usize {
        let before = self.slots.len();
        self.slots.retain(|slot| {
            !matches!(&slot.kind, SlotKind::Placeholder { id: tagged, .. } if tagged == id)
        });
        before - self.slots.len()
    }
}

/// Handle shared by the feed and the view, the way both sides of a real host
/// look at the same document.
#[derive(Debug, Clone, Default)]
pub struct FakePage(Rc<RefCell<Page>>);

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_ad(&self, ad: ExtractedAd) -> u64 {
        self.0.borrow_mut().push(SlotKind::Ad {
            read: Ok(ad),
            hidden: false,
            affordances: None,
        })
    }

    pub fn add_loading(&self) -> u64 {
        self.0.borrow_mut().push(SlotKind::Ad {
            read: Err(ExtractionError::NotRendered {
                reason: "title missing".to_string(),
            }),
            hidden: false,
            affordances: None,
        })
    }

    pub fn add_banner(&self) -> u64 {
        self.0.borrow_mut().push(SlotKind::Banner)
    }

    /// Simulate a placeholder left behind by an earlier page render.
    pub fn add_placeholder(&self, id: &str) -> u64 {
        self.0.borrow_mut().push(SlotKind::Placeholder {
            id: id.to_string(),
            title: "stale".to_string(),
        })
    }

    /// Finish rendering a slot added with `add_loading`.
    pub fn finish_render(&self, key: u64, ad: ExtractedAd) {
        let mut page = self.0.borrow_mut();
        if let Some(slot) = page.slots.iter_mut().find(|slot| slot.key == key) {
            if let SlotKind::Ad { read, .. } = &mut slot.kind {
                *read = Ok(ad);
            }
        }
    }

    pub fn feed(&self) -> FakeFeed {
        FakeFeed { page: self.clone() }
    }

    pub fn view(&self) -> FakeView {
        FakeView { page: self.clone() }
    }

    pub fn placeholders(&self, id: &str) -> Vec<String> {
        self.0
            .borrow()
            .slots
            .iter()
            .filter_map(|slot| match &slot.kind {
                SlotKind::Placeholder { id: tagged, title } if tagged == id => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn placeholder_total(&self) -> usize {
        self.0
            .borrow()
            .slots
            .iter()
            .filter(|slot| matches!(slot.kind, SlotKind::Placeholder { .. }))
            .count()
    }

    pub fn is_hidden(&self, key: u64) -> bool {
        let page = self.0.borrow();
        page.slots.iter().any(|slot| {
            slot.key == key && matches!(slot.kind, SlotKind::Ad { hidden: true, .. })
        })
    }

    pub fn affordances(&self, key: u64) -> Option<Affordances> {
        let page = self.0.borrow();
        page.slots.iter().find_map(|slot| match &slot.kind {
            SlotKind::Ad { affordances, .. } if slot.key == key => affordances.clone(),
            _ => None,
        })
    }

    pub fn attach_calls(&self) -> usize {
        self.0.borrow().attach_calls
    }

    pub fn contacted(&self, id: &str) -> Option<bool> {
        self.0.borrow().contacted.get(id).copied()
    }

    pub fn applied(&self) -> Vec<Directive> {
        self.0.borrow().applied.clone()
    }

    /// Whether a placeholder for `id` sits directly before slot `key`.
    pub fn placeholder_precedes(&self, id: &str, key: u64) -> bool {
        let page = self.0.borrow();
        let Some(entry) = page.position(key) else {
            return false;
        };
        entry > 0
            && matches!(
                &page.slots[entry - 1].kind,
                SlotKind::Placeholder { id: tagged, .. } if tagged == id
            )
    }
}

#[derive(Debug, Clone)]
pub struct FakeFeed {
    page: FakePage,
}

impl ExtractionAdapter for FakeFeed {
    type Entry = u64;

    fn candidates(&self) -> Vec<u64> {
        self.page.0.borrow().slots.iter().map(|slot| slot.key).collect()
    }

    fn extract(&self, entry: &u64) -> Result<ExtractedAd, ExtractionError> {
        let page = self.page.0.borrow();
        let slot = page
            .slots
            .iter()
            .find(|slot| slot.key == *entry)
            .ok_or_else(|| ExtractionError::NotRendered {
                reason: "detached".to_string(),
            })?;
        match &slot.kind {
            SlotKind::Ad { read, .. } => read.clone(),
            SlotKind::Banner | SlotKind::Placeholder { .. } => Err(ExtractionError::NotAnAd {
                reason: "no ad link".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeView {
    page: FakePage,
}

impl PresentationSink for FakeView {
    type Entry = u64;

    fn is_placeholder(&self, entry: &u64) -> bool {
        let page = self.page.0.borrow();
        page.slots
            .iter()
            .any(|slot| slot.key == *entry && matches!(slot.kind, SlotKind::Placeholder { .. }))
    }

    fn placeholder_count(&self, id: &str) -> usize {
        self.page.placeholders(id).len()
    }

    fn has_affordances(&self, entry: &u64) -> bool {
        self.page.affordances(*entry).is_some()
    }

    fn apply(&mut self, entry: &u64, directive: &Directive) {
        let mut page = self.page.0.borrow_mut();
        page.applied.push(directive.clone());

        match directive {
            Directive::Skip => {}
            Directive::Suppress {
                id,
                placeholder,
                replace_existing,
            } => {
                if *replace_existing {
                    page.remove_placeholders(id);
                }
                let Some(position) = page.position(*entry) else {
                    return;
                };
                if let SlotKind::Ad { hidden, .. } = &mut page.slots[position].kind {
                    *hidden = true;
                }
                if let Some(placeholder) = placeholder {
                    let key = page.next_key;
                    page.next_key += 1;
                    page.slots.insert(
                        position,
                        Slot {
                            key,
                            kind: SlotKind::Placeholder {
                                id: placeholder.id.clone(),
                                title: placeholder.title.clone(),
                            },
                        },
                    );
                }
            }
            Directive::Show {
                id,
                remove_stale_placeholders,
                affordances,
            } => {
                if *remove_stale_placeholders {
                    page.remove_placeholders(id);
                }
                if affordances.is_some() {
                    page.attach_calls += 1;
                }
                let Some(position) = page.position(*entry) else {
                    return;
                };
                if let SlotKind::Ad {
                    hidden,
                    affordances: attached,
                    ..
                } = &mut page.slots[position].kind
                {
                    *hidden = false;
                    if let Some(new) = affordances {
                        *attached = Some(new.clone());
                    }
                }
            }
        }
    }

    fn remove_placeholders(&mut self, id: &str) -> usize {
        self.page.0.borrow_mut().remove_placeholders(id)
    }

    fn contacted_changed(&mut self, id: &str, contacted: bool) {
        self.page
            .0
            .borrow_mut()
            .contacted
            .insert(id.to_string(), contacted);
    }
}

pub fn ad(id: &str, title: &str) -> ExtractedAd {
    ExtractedAd {
        id: id.to_string(),
        title: title.to_string(),
        price: "20 €".to_string(),
        location: "04109 Leipzig".to_string(),
        url: format!("https://www.example.org/s-anzeige/item/{}-80-1234", id),
        category: "Elektronik".to_string(),
        category_path: "elektronik".to_string(),
        description: String::new(),
    }
}

pub fn ad_in(id: &str, title: &str, category: &str) -> ExtractedAd {
    ExtractedAd {
        category: category.to_string(),
        ..ad(id, title)
    }
}
