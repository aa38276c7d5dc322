//! Text processing for the cafe tutor
//!
//! Tutor replies mix Chinese dialogue with translations, pinyin and word
//! breakdowns. Only the dialogue is sent to speech synthesis:
//! - **Speakable filter**: keeps target-script tokens and the learner's name
//! - **Sections**: splits a reply at its `---` delimiter
//!
//! # Example
//!
//! ```
//! use tutor_text_processing::SpeakableFilter;
//!
//! let filter = SpeakableFilter::default();
//! let reply = "你好！(nǐ hǎo!)\nTry saying: 我叫... - My name is...";
//! assert_eq!(filter.extract(reply, None).as_deref(), Some("你好！"));
//! ```

pub mod sections;
pub mod speakable;

mod error;

pub use error::{Result, TextProcessingError};
pub use sections::{primary_section, SECTION_DELIMITER};
pub use speakable::{SpeakableFilter, DEFAULT_SKIP_MARKERS};
