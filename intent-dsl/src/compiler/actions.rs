//! Clause classification
//!
//! A statement's leading word is mapped to a closed [`Verb`], and every verb
//! has exactly one [`ActionKind`]. Words outside the table become
//! [`Verb::Other`], which classifies as `configure`, so classification never
//! rejects a clause.

use super::ir::{Action, ActionKind};
use crate::parser::ast::Statement;

/// Leading words the classifier recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    // display
    Show,
    Display,
    List,
    Render,
    View,
    Highlight,
    // interact
    Click,
    Tap,
    Press,
    Select,
    Toggle,
    Drag,
    Submit,
    // input
    Enter,
    Type,
    Fill,
    Upload,
    Input,
    Choose,
    // navigate
    Navigate,
    Go,
    Redirect,
    Open,
    Visit,
    // condition
    If,
    When,
    Unless,
    Otherwise,
    Else,
    // loop
    For,
    Each,
    Repeat,
    // query
    Fetch,
    Get,
    Find,
    Load,
    Query,
    Search,
    Filter,
    Sort,
    Count,
    // create
    Create,
    Add,
    Insert,
    Save,
    Register,
    Generate,
    // update
    Update,
    Edit,
    Change,
    Modify,
    Mark,
    // delete
    Delete,
    Remove,
    Archive,
    Clear,
    // validate
    Check,
    Validate,
    Verify,
    Ensure,
    // respond
    Respond,
    Return,
    Reply,
    // send
    Send,
    Email,
    Notify,
    Publish,
    Emit,
    Broadcast,
    // assign
    Set,
    Assign,
    Store,
    Increment,
    Decrement,
    Calculate,
    // alert
    Alert,
    Warn,
    // log
    Log,
    Record,
    Track,
    Audit,
    // delay
    Wait,
    Delay,
    Pause,
    Schedule,
    // retry
    Retry,

    Other,
}

impl From<&str> for Verb {
    fn from(word: &str) -> Self {
        match word.to_lowercase().as_str() {
            "show" | "shows" | "showing" => Verb::Show,
            "display" | "displays" => Verb::Display,
            "list" | "lists" => Verb::List,
            "render" | "renders" => Verb::Render,
            "view" | "see" => Verb::View,
            "highlight" | "highlights" => Verb::Highlight,

            "click" | "clicks" | "clicking" => Verb::Click,
            "tap" | "taps" | "tapping" => Verb::Tap,
            "press" | "pressing" => Verb::Press,
            "select" | "selecting" => Verb::Select,
            "toggle" | "toggling" => Verb::Toggle,
            "drag" | "dragging" => Verb::Drag,
            "submit" | "submitting" => Verb::Submit,

            "enter" | "entering" => Verb::Enter,
            "type" | "typing" => Verb::Type,
            "fill" | "filling" => Verb::Fill,
            "upload" | "uploading" => Verb::Upload,
            "input" => Verb::Input,
            "choose" | "pick" => Verb::Choose,

            "navigate" | "navigates" => Verb::Navigate,
            "go" | "goes" => Verb::Go,
            "redirect" | "redirects" => Verb::Redirect,
            "open" | "opens" => Verb::Open,
            "visit" | "visits" => Verb::Visit,

            "if" => Verb::If,
            "when" | "whenever" => Verb::When,
            "unless" => Verb::Unless,
            "otherwise" => Verb::Otherwise,
            "else" => Verb::Else,

            "for" => Verb::For,
            "each" | "every" => Verb::Each,
            "repeat" => Verb::Repeat,

            "fetch" => Verb::Fetch,
            "get" => Verb::Get,
            "find" => Verb::Find,
            "load" => Verb::Load,
            "query" => Verb::Query,
            "search" => Verb::Search,
            "filter" => Verb::Filter,
            "sort" => Verb::Sort,
            "count" => Verb::Count,

            "create" | "creates" => Verb::Create,
            "add" | "adds" => Verb::Add,
            "insert" => Verb::Insert,
            "save" | "saves" => Verb::Save,
            "register" => Verb::Register,
            "generate" => Verb::Generate,

            "update" | "updates" => Verb::Update,
            "edit" => Verb::Edit,
            "change" => Verb::Change,
            "modify" => Verb::Modify,
            "mark" => Verb::Mark,

            "delete" | "deletes" => Verb::Delete,
            "remove" | "removes" => Verb::Remove,
            "archive" => Verb::Archive,
            "clear" => Verb::Clear,

            "check" => Verb::Check,
            "validate" => Verb::Validate,
            "verify" => Verb::Verify,
            "ensure" => Verb::Ensure,

            "respond" | "responds" => Verb::Respond,
            "return" | "returns" => Verb::Return,
            "reply" => Verb::Reply,

            "send" | "sends" => Verb::Send,
            "email" => Verb::Email,
            "notify" | "notifies" => Verb::Notify,
            "publish" => Verb::Publish,
            "emit" => Verb::Emit,
            "broadcast" => Verb::Broadcast,

            "set" => Verb::Set,
            "assign" => Verb::Assign,
            "store" => Verb::Store,
            "increment" => Verb::Increment,
            "decrement" => Verb::Decrement,
            "calculate" | "compute" => Verb::Calculate,

            "alert" => Verb::Alert,
            "warn" => Verb::Warn,

            "log" => Verb::Log,
            "record" => Verb::Record,
            "track" => Verb::Track,
            "audit" => Verb::Audit,

            "wait" => Verb::Wait,
            "delay" => Verb::Delay,
            "pause" => Verb::Pause,
            "schedule" => Verb::Schedule,

            "retry" => Verb::Retry,

            _ => Verb::Other,
        }
    }
}

impl Verb {
    pub fn action_kind(self) -> ActionKind {
        match self {
            Verb::Show
            | Verb::Display
            | Verb::List
            | Verb::Render
            | Verb::View
            | Verb::Highlight => ActionKind::Display,

            Verb::Click
            | Verb::Tap
            | Verb::Press
            | Verb::Select
            | Verb::Toggle
            | Verb::Drag
            | Verb::Submit => ActionKind::Interact,

            Verb::Enter | Verb::Type | Verb::Fill | Verb::Upload | Verb::Input | Verb::Choose => {
                ActionKind::Input
            }

            Verb::Navigate | Verb::Go | Verb::Redirect | Verb::Open | Verb::Visit => {
                ActionKind::Navigate
            }

            Verb::If | Verb::When | Verb::Unless | Verb::Otherwise | Verb::Else => {
                ActionKind::Condition
            }

            Verb::For | Verb::Each | Verb::Repeat => ActionKind::Loop,

            Verb::Fetch
            | Verb::Get
            | Verb::Find
            | Verb::Load
            | Verb::Query
            | Verb::Search
            | Verb::Filter
            | Verb::Sort
            | Verb::Count => ActionKind::Query,

            Verb::Create
            | Verb::Add
            | Verb::Insert
            | Verb::Save
            | Verb::Register
            | Verb::Generate => ActionKind::Create,

            Verb::Update | Verb::Edit | Verb::Change | Verb::Modify | Verb::Mark => {
                ActionKind::Update
            }

            Verb::Delete | Verb::Remove | Verb::Archive | Verb::Clear => ActionKind::Delete,

            Verb::Check | Verb::Validate | Verb::Verify | Verb::Ensure => ActionKind::Validate,

            Verb::Respond | Verb::Return | Verb::Reply => ActionKind::Respond,

            Verb::Send
            | Verb::Email
            | Verb::Notify
            | Verb::Publish
            | Verb::Emit
            | Verb::Broadcast => ActionKind::Send,

            Verb::Set
            | Verb::Assign
            | Verb::Store
            | Verb::Increment
            | Verb::Decrement
            | Verb::Calculate => ActionKind::Assign,

            Verb::Alert | Verb::Warn => ActionKind::Alert,

            Verb::Log | Verb::Record | Verb::Track | Verb::Audit => ActionKind::Log,

            Verb::Wait | Verb::Delay | Verb::Pause | Verb::Schedule => ActionKind::Delay,

            Verb::Retry => ActionKind::Retry,

            Verb::Other => ActionKind::Configure,
        }
    }
}

/// Classify a clause by its leading word.
pub fn classify(kind: &str) -> ActionKind {
    Verb::from(kind).action_kind()
}

/// Lower a statement into an action.
pub fn action_from(statement: &Statement) -> Action {
    let action_type = classify(&statement.kind);
    tracing::trace!(kind = %statement.kind, action = %action_type, "classified clause");
    Action {
        action_type,
        text: statement.text.clone(),
    }
}

pub fn actions_from(statements: &[Statement]) -> Vec<Action> {
    statements.iter().map(action_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_words() {
        assert_eq!(classify("show"), ActionKind::Display);
        assert_eq!(classify("clicking"), ActionKind::Interact);
        assert_eq!(classify("enter"), ActionKind::Input);
        assert_eq!(classify("navigate"), ActionKind::Navigate);
        assert_eq!(classify("if"), ActionKind::Condition);
        assert_eq!(classify("for"), ActionKind::Loop);
        assert_eq!(classify("fetch"), ActionKind::Query);
        assert_eq!(classify("create"), ActionKind::Create);
        assert_eq!(classify("update"), ActionKind::Update);
        assert_eq!(classify("delete"), ActionKind::Delete);
        assert_eq!(classify("check"), ActionKind::Validate);
        assert_eq!(classify("respond"), ActionKind::Respond);
        assert_eq!(classify("send"), ActionKind::Send);
        assert_eq!(classify("set"), ActionKind::Assign);
        assert_eq!(classify("alert"), ActionKind::Alert);
        assert_eq!(classify("log"), ActionKind::Log);
        assert_eq!(classify("wait"), ActionKind::Delay);
        assert_eq!(classify("retry"), ActionKind::Retry);
    }

    #[test]
    fn test_classify_is_total() {
        assert_eq!(classify("repository:"), ActionKind::Configure);
        assert_eq!(classify(""), ActionKind::Configure);
        assert_eq!(classify("frobnicate"), ActionKind::Configure);
    }

    #[test]
    fn test_classify_ignores_case() {
        assert_eq!(classify("Show"), ActionKind::Display);
        assert_eq!(Verb::from("DELETE"), Verb::Delete);
    }

    #[test]
    fn test_action_from_keeps_text() {
        let statement = Statement {
            kind: "send".to_string(),
            text: "send a welcome email".to_string(),
            line: 4,
        };
        let action = action_from(&statement);
        assert_eq!(action.action_type, ActionKind::Send);
        assert_eq!(action.text, "send a welcome email");
    }
}
