pub mod upload_state;
