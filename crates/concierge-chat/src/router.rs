//! Rule-based query routing.
//!
//! Cheap keyword rules claim commands and scheduling requests before any LLM
//! call is made. Everything unclaimed goes to the agent.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use concierge_action::DateParser;
use concierge_core::types::ContactField;

/// Where a message should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ClearHistory,
    ListCalls,
    Help,
    Recall,
    Schedule,
    Cancel,
    UpdateContact(ContactField),
    SchedulingHelp,
    /// Free-form request for the LLM agent or retrieval chain.
    Agent,
}

// =============================================================================
// Compiled regex sets (compiled once, reused across calls)
// =============================================================================

struct RoutePatterns {
    list_calls: Regex,
    help: Regex,
    recall: Regex,
    time: Regex,
    cancel: Regex,
    change: Regex,
    email: Regex,
    phone: Regex,
    name: Regex,
    scheduling: Regex,
}

static PATTERNS: LazyLock<RoutePatterns> = LazyLock::new(|| {
    let re = |p: &str| Regex::new(p).expect("Invalid route regex");

    RoutePatterns {
        list_calls: re(r"(?i)\bshow\s+scheduled\s+calls\b"),
        help: re(
            r"(?i)\b(?:help|how\s+to|guide|explain|what\s+can\s+you\s+do|capabilities|features)\b",
        ),
        recall: re(
            r"(?i)\b(?:what\s+did\s+i\s+just|last\s+question|previous|what\s+were\s+we\s+talking\s+about|what\s+was\s+i\s+saying)\b",
        ),
        time: re(
            r"(?i)\b(?:morning|afternoon|evening|night|today|tomorrow|next|weekend|monday|tuesday|wednesday|thursday|friday|saturday|sunday|week|month|o'clock)\b|\d:00\b|\d\s*(?:am|pm)\b",
        ),
        cancel: re(r"(?i)\b(?:cancel|reschedule)\b"),
        change: re(r"(?i)\b(?:change|update)\b"),
        email: re(r"(?i)\be-?mail\b"),
        phone: re(r"(?i)\bphone\b"),
        name: re(r"(?i)\bname\b"),
        scheduling: re(
            r"(?i)\b(?:schedul(?:e|ed|ing)|book(?:ed|ing)?|appointments?|calls?|meet(?:s|ing|ings)?|want\s+to\s+talk|discuss|consultation|set\s+up|arrange|catch\s+up|sync|connect|get\s+in\s+touch|reach\s+out)\b",
        ),
    }
});

const CLEAR_COMMANDS: &[&str] = &["clear history", "clear chat", "erase history", "erase chat"];
const BARE_COMMANDS: &[&str] = &["call", "schedule", "book"];

/// Classifies messages with ordered keyword rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryRouter;

impl QueryRouter {
    pub fn new() -> Self {
        Self
    }

    /// Pick a route for `query`.
    ///
    /// `has_contact` enables the rules that only make sense once contact
    /// details are on file. `today` anchors explicit date detection.
    pub fn route(&self, query: &str, has_contact: bool, today: NaiveDate) -> Route {
        let p = &*PATTERNS;
        let normalized = query.trim().to_lowercase();

        if CLEAR_COMMANDS.contains(&normalized.as_str()) {
            return Route::ClearHistory;
        }
        if p.list_calls.is_match(query) {
            return Route::ListCalls;
        }
        if p.help.is_match(query) {
            return Route::Help;
        }
        if p.recall.is_match(query) {
            return Route::Recall;
        }

        if has_contact {
            if p.time.is_match(query) || DateParser::parse(query, today).is_some() {
                return Route::Schedule;
            }
            if p.cancel.is_match(query) {
                return Route::Cancel;
            }
            if p.change.is_match(query) {
                if let Some(field) = mentioned_field(query) {
                    return Route::UpdateContact(field);
                }
            }
        }

        if BARE_COMMANDS.contains(&normalized.as_str()) {
            return Route::SchedulingHelp;
        }
        if p.scheduling.is_match(query) {
            return Route::Schedule;
        }

        Route::Agent
    }
}

fn mentioned_field(query: &str) -> Option<ContactField> {
    let p = &*PATTERNS;
    if p.email.is_match(query) {
        Some(ContactField::Email)
    } else if p.phone.is_match(query) {
        Some(ContactField::Phone)
    } else if p.name.is_match(query) {
        Some(ContactField::Name)
    } else {
        None
    }
}
