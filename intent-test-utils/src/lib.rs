//! Intent Test Utilities
//!
//! Shared test infrastructure for the intent workspace:
//! - Sample documents covering every block type
//! - Proptest strategies that generate well-formed source text
//!
//! Everything here produces plain source strings, so the crate has no
//! dependency on the front end it is used to test.

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built documents for common testing scenarios.

    /// A complete document touching every block type.
    pub const TASKFLOW: &str = r#"app TaskFlow is a web application

── Data ──

data User:
  has a name which is text
  has an email which is unique email
  has a password which is encrypted text
  has many Task

data Task:
  has a title which is text
  has an optional description which is text
  has a status which is either "todo", "doing", or "done"
  has a priority which is number and defaults to 3
  has a due date which is date
  belongs to a User
  has many Tag through TaskTag

── Screens ──

page Dashboard:
  show a greeting with the user's name
  list all tasks sorted by due date
  clicking a task navigates to TaskDetail

component TaskCard:
  accepts title, status, and due date
  display the title in bold

── Backend ──

api CreateTask:
  requires authentication
  accepts title, description and due date
  check that title is not empty
  check that due date is in the future
  create a Task with the given fields
  respond with the created task

api ListTasks:
  fetch all tasks for the current user
  respond with the tasks

policy FreeUser:
  can create up to 50 tasks per month
  cannot export reports

when a task is completed:
  notify the task owner:
    via email
  log the completion

when code is pushed to main:
  run the test suite
  deploy to staging

if the database is unreachable:
  retry 3 times
  alert the on-call engineer

theme:
  primary color is #6C5CE7
  font is Inter
  dark mode is enabled

authentication:
  method email and password
  allow login with google and github
  sessions expire after 30 days

database:
  use PostgreSQL
  index Task by status and due date

integrate with Stripe:
  api key from environment variable STRIPE_SECRET_KEY
  use for payments

environment production:
  url is "https://taskflow.app"
  replicas is 3

build with:
  frontend using React with TypeScript
  backend using Node with Express
  deploy to Docker

architecture: microservices
  service UserService:
    handles signup, login and profiles
    runs on port 3001
  service TaskService:
    owns Task
    talks to UserService
  gateway:
    routes /api/tasks to TaskService
  message broker is RabbitMQ

── Monitoring ──

track response time for TaskService
alert on slack when error rate is above 5% for 10 minutes
"#;

    /// Three blocks; the page header on line 4 is missing its colon.
    pub const BROKEN_PAGE_HEADER: &str = "data User:
  has a name which is text

page Dashboard
  show tasks

api ListTasks:
  fetch all tasks
";

    /// Line 3 dedents to a width that was never pushed.
    pub const INCONSISTENT_DEDENT: &str = "page Home:
    show tasks
  show more
";

    /// A larger document of `n` data/page pairs for benchmarks.
    pub fn generated_document(n: usize) -> String {
        let mut source = String::from("app Generated is a web application\n\n");
        for i in 0..n {
            source.push_str(&format!(
                "data Model{i}:\n  has a title which is text\n  has an optional score which is number\n  has many Item{i}\n\n"
            ));
            source.push_str(&format!(
                "page Screen{i}:\n  show all items\n  clicking an item navigates to Detail{i}\n\n"
            ));
            source.push_str(&format!(
                "api Fetch{i}:\n  requires authentication\n  check that title is not empty\n  respond with the items\n\n"
            ));
        }
        source
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating intent source text.

    use proptest::prelude::*;

    const FIELD_NAMES: [&str; 8] = [
        "title", "summary", "score", "label", "rank", "notes", "budget", "status",
    ];

    const FIELD_TYPES: [&str; 6] = ["text", "number", "decimal", "date", "boolean", "email"];

    const CLAUSES: [&str; 8] = [
        "show all items",
        "list the latest entries",
        "fetch the current user",
        "create a record",
        "send a confirmation email",
        "update the counter",
        "clicking a row navigates to Detail",
        "respond with the result",
    ];

    /// A capitalized name. Keywords are lowercase, so these never collide.
    pub fn arb_type_name() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{2,8}"
    }

    /// A lowercase word.
    pub fn arb_word() -> impl Strategy<Value = String> {
        "[a-z]{1,8}"
    }

    pub fn arb_field_clause() -> impl Strategy<Value = String> {
        (
            prop::sample::select(FIELD_NAMES.to_vec()),
            prop::sample::select(FIELD_TYPES.to_vec()),
            any::<bool>(),
        )
            .prop_map(|(name, ty, optional)| {
                if optional {
                    format!("has an optional {} which is {}", name, ty)
                } else {
                    format!("has a {} which is {}", name, ty)
                }
            })
    }

    pub fn arb_clause() -> impl Strategy<Value = String> {
        prop::sample::select(CLAUSES.to_vec()).prop_map(str::to_string)
    }

    /// One well-formed top-level block. The header is always the first line
    /// and is the only line ending in a colon.
    pub fn arb_block() -> impl Strategy<Value = String> {
        prop_oneof![
            (arb_type_name(), prop::collection::vec(arb_field_clause(), 1..5)).prop_map(
                |(name, fields)| format!("data {}:\n{}", name, indent_lines(&fields))
            ),
            (arb_type_name(), prop::collection::vec(arb_clause(), 1..5)).prop_map(
                |(name, clauses)| format!("page {}:\n{}", name, indent_lines(&clauses))
            ),
            (
                arb_type_name(),
                any::<bool>(),
                prop::collection::vec(arb_clause(), 1..4)
            )
                .prop_map(|(name, auth, mut clauses)| {
                    if auth {
                        clauses.insert(0, "requires authentication".to_string());
                    }
                    format!("api {}:\n{}", name, indent_lines(&clauses))
                }),
            (arb_type_name(), prop::collection::vec(arb_clause(), 1..4)).prop_map(
                |(name, clauses)| format!("when a {} is created:\n{}", name, indent_lines(&clauses))
            ),
            arb_type_name().prop_map(|name| {
                format!("policy {}:\n  can view items\n  cannot delete items\n", name)
            }),
        ]
    }

    /// Several well-formed blocks.
    pub fn arb_blocks() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(arb_block(), 2..8)
    }

    /// Lines with arbitrary but consistent indentation (each line at most one
    /// level deeper than the previous), mixed with blank and comment lines.
    pub fn arb_indented_source() -> impl Strategy<Value = String> {
        prop::collection::vec((0usize..5, 0u8..10, "[a-z]{1,6}( [a-z]{1,6}){0,3}"), 0..40)
            .prop_map(|lines| {
                let mut out = String::new();
                let mut level = 0usize;
                for (wanted, shape, text) in lines {
                    match shape {
                        0 => out.push('\n'),
                        1 => out.push_str("# comment line\n"),
                        _ => {
                            level = wanted.min(level + 1);
                            out.push_str(&"  ".repeat(level));
                            out.push_str(&text);
                            out.push('\n');
                        }
                    }
                }
                out
            })
    }

    /// Remove the colon that closes a block header.
    pub fn break_header(block: &str) -> String {
        block.replacen(":\n", "\n", 1)
    }

    fn indent_lines(lines: &[String]) -> String {
        lines.iter().map(|l| format!("  {}\n", l)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn blocks_have_single_header_colon(block in arb_block()) {
            prop_assert_eq!(block.matches(":\n").count(), 1);
            let first_line = block.lines().next().unwrap_or_default();
            prop_assert!(first_line.ends_with(':'));
        }
    }

    #[test]
    fn test_break_header() {
        assert_eq!(break_header("page Home:\n  show tasks\n"), "page Home\n  show tasks\n");
    }
}
