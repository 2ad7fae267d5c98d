/*!
 * Chat orchestration on top of the session store and the chat service.
 *
 * - `orchestrator`: chat turns with optional translation, and the single-shot relay
 * - `reply`: extraction of assistant text from chat service payloads
 */

pub mod orchestrator;
pub mod reply;

pub use orchestrator::{build_outbound, ChatOrchestrator, ChatOutcome, ChatTurn, RelayOutcome};
pub use reply::extract_reply;
