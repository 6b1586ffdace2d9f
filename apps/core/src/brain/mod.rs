//! # Brain Module
//!
//! Rule-based question answering for the Maman & Bébé chatbot.
//! No LLM involved: keyword index, lexical (optionally semantic) scoring and
//! conservative emergency detection.
//!
//! ## Components
//! - `intent`: Intent records and the fail-soft loader
//! - `keywords`: Text normalization and stop words
//! - `index`: Inverted keyword index
//! - `urgency`: Emergency / urgency detection
//! - `semantic_intent`: Optional embedding backend
//! - `scorer`: Lexical and lexical+semantic scoring strategies
//! - `matcher`: Candidate scoring and selection
//! - `responder`: Response texts and quick replies
//! - `query_result`: Output data structures
//! - `processor`: Main orchestrator

pub mod index;
pub mod intent;
pub mod keywords;
pub mod matcher;
pub mod processor;
pub mod query_result;
pub mod responder;
pub mod scorer;
pub mod semantic_intent;
pub mod urgency;

pub use index::KeywordIndex;
pub use intent::{load_intents, load_intents_or_empty, parse_intents, Intent, Urgency};
pub use matcher::{IntentMatch, IntentMatcher, IntentSnapshot, MatchOutcome, MatchParams};
pub use processor::{HealthProcessor, QueryContext};
pub use query_result::{MessageReply, QueryResult};
pub use scorer::{LexicalPlusSemanticScorer, LexicalScorer, Scorer};
pub use semantic_intent::Embedder;
pub use urgency::{UrgencyAssessment, UrgencyDetector, UrgencyTrigger};
