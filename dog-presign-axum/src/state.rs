use std::sync::Arc;

use dog_presign::TransferOrchestrator;

#[derive(Clone)]
pub struct PresignState {
    pub transfers: Arc<TransferOrchestrator>,
}

impl PresignState {
    pub fn new(transfers: TransferOrchestrator) -> Self {
        Self {
            transfers: Arc::new(transfers),
        }
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.transfers.config().max_file_bytes
    }
}
