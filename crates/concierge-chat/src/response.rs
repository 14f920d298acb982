//! Canned replies that need no LLM.

use concierge_llm::{ChatMessage, Role};

pub const HISTORY_CLEARED: &str = "Chat history has been cleared.";

pub const START_OF_CONVERSATION: &str = "This is the start of our conversation.";

pub const HELP_TEXT: &str = "I can help you with the following:

1. Schedule Appointments:
   - \"Schedule a call\"
   - \"Book an appointment\"
   - \"Let's meet next week\"

2. Manage Your Information:
   - Update contact details (\"change my email\")
   - Cancel or reschedule appointments
   - \"show scheduled calls\" to list your bookings

3. Answer Questions:
   - Ask about any topic in the loaded documents
   - Get clarification on previous responses
   - Check conversation history

4. Date and Time:
   - Use natural language (\"next Monday\", \"tomorrow afternoon\")
   - Specify exact dates (MM/DD/YYYY or \"December 25th\")

5. Commands:
   - \"clear chat\" - Erase conversation history
   - \"help\" - Show this help message
   - \"cancel\" - Cancel your latest appointment
   - \"quit\" - Exit

How can I assist you today?";

pub const SCHEDULING_HELP: &str = "Would you like to schedule a call? Here's how:

1. Say \"I want to schedule a call\" or \"Book an appointment\"
2. I'll collect your contact information
3. Then specify your preferred time:
   - \"tomorrow morning\"
   - \"next Monday afternoon\"
   - \"December 25th at 2pm\"
   - Or any specific date (MM/DD/YYYY)

Please let me know how you'd like to proceed!";

/// Summarise the given recent messages, oldest first.
pub fn history_summary(recent: &[ChatMessage]) -> String {
    if recent.is_empty() {
        return START_OF_CONVERSATION.to_string();
    }

    let mut summary = String::from("Recent conversation:\n");
    for msg in recent {
        let speaker = match msg.role {
            Role::User => "You",
            _ => "Bot",
        };
        summary.push_str(&format!("\n{}: {}", speaker, msg.content));
    }
    summary
}
