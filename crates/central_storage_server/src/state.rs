use central_storage_core::prelude::*;

/// Router state needed to authenticate signed requests.
#[derive(Clone)]
pub struct VerifierState<C: ConsumerStore> {
    pub consumers: C,
    pub signer: RequestSigner,
}

impl<C: ConsumerStore> VerifierState<C> {
    pub fn new(consumers: C) -> Self {
        Self {
            consumers,
            signer: RequestSigner::default(),
        }
    }
}
