#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UploadState {
    Receiving,
    Validating,
    Writing,
    Committed,
    Failed,
}

impl UploadState {
    pub fn value(&self) -> String {
        match *self {
            UploadState::Receiving => "receiving".to_string(),
            UploadState::Validating => "validating".to_string(),
            UploadState::Writing => "writing".to_string(),
            UploadState::Committed => "committed".to_string(),
            UploadState::Failed => "failed".to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        match *self {
            UploadState::Committed | UploadState::Failed => true,
            _ => false,
        }
    }

    pub fn can_transition_to(&self, next: &UploadState) -> bool {
        match *self {
            UploadState::Receiving => matches!(next, UploadState::Validating | UploadState::Failed),
            UploadState::Validating => matches!(next, UploadState::Writing | UploadState::Failed),
            UploadState::Writing => matches!(next, UploadState::Committed | UploadState::Failed),
            UploadState::Committed | UploadState::Failed => false,
        }
    }
}
