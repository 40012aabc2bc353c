//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_get`] or [`expect_create`] to assert what
//! the client sent and script the actor's reply.

use crate::actor_framework::{Entity, ResourceClient, ResourceRequest, Response};
use tokio::sync::mpsc;

/// Creates a mock client and a receiver for asserting requests.
///
/// Clients such as `OrderClient` orchestrate several actors. Instead of
/// spinning up real `ResourceActor`s, the test holds the receiving end of the
/// client's channel, inspects each request, and answers it with whatever
/// success, failure or delay the scenario needs.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, Response<T, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<T, Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Patch, Response<T, T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Update { id, patch, respond_to }) => Some((id, patch, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T, T::ActionResult>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::FrameworkError;
    use crate::clients::{AccessPolicy, StallClient};
    use crate::clock::{Clock, ManualClock};
    use crate::domain::{Stall, StallRegistration};
    use crate::stall_actor::{StallAction, StallError};

    #[tokio::test]
    async fn test_mock_client() {
        let clock = ManualClock::fixed();
        let (inner, mut receiver) = create_mock_client::<Stall>(10);
        let stalls = StallClient::new(inner, clock.shared(), AccessPolicy::default());

        let register_task = {
            let stalls = stalls.clone();
            tokio::spawn(async move { stalls.register_stall(StallRegistration::new("s1", "Test", vec![])).await })
        };

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.id, "s1");
        let stall = Stall::from_create_params(payload.id.clone(), payload, clock.now()).unwrap();
        responder.send(Ok(stall.clone())).unwrap();
        assert_eq!(register_task.await.unwrap(), Ok(stall));

        // Scripted failure on the action path
        let top_up_task = tokio::spawn(async move { stalls.top_up("s1".into(), "UTR9".into()).await });
        let (id, action, responder) = expect_action(&mut receiver).await.expect("Expected Action request");
        assert_eq!(id, "s1");
        assert!(matches!(action, StallAction::TopUp { ref proof_ref, .. } if proof_ref == "UTR9"));
        responder.send(Err(FrameworkError::ActorDropped)).unwrap();

        let err = top_up_task.await.unwrap().unwrap_err();
        assert!(matches!(err, StallError::TransportFailure(_)));
    }
}
