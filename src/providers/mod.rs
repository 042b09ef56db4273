//! Generation provider integration
//!
//! Workout plans and speech are produced by an external OpenAI-compatible
//! service. Handlers only see the `GenerationProvider` trait.

pub mod traits;
pub mod openai;

// Re-export commonly used types
pub use traits::{
    GenerationProvider,
    ProviderError,
    ProviderResult,
    SpeechRequest,
    WorkoutRequest,
};
pub use openai::OpenAiProvider;
