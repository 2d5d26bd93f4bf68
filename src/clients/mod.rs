pub mod food_api;
pub mod gemini;

pub use food_api::HttpFoodDatabase;
pub use gemini::GeminiClient;
