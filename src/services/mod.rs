pub mod chat_service;
pub mod upload_signer;

// Re-export for convenience
pub use chat_service::ChatService;
pub use upload_signer::UploadSigner;
