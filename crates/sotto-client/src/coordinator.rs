//! The bifurcation coordinator.
//!
//! A message is two records in two stores: its body in the vault, its
//! pointer in the chat server's index.  The coordinator owns the protocol
//! that keeps the two from ever disagreeing about existence:
//!
//! - **Send** writes the body first and the pointer second.  A pointer may
//!   never reference a document that might not exist, so step 2 starts
//!   only after step 1 has returned a document id.  If the pointer write
//!   fails, the body is left behind as an orphan -- unreferenced, hence
//!   invisible to every reader -- and the whole send can be retried
//!   safely (the append is idempotent on the document reference).
//! - **Read** lists pointers first, then batch-fetches bodies, then joins
//!   by document id *in pointer order*.  The index's ordering is the only
//!   ordering signal there is; bodies carry no timestamp.

use tracing::debug;

use sotto_shared::protocol::ChatMessage;
use sotto_shared::types::{DocumentId, UserId};

use crate::content::{ContentStore, DocumentRef};
use crate::error::CoordinatorError;
use crate::server_api::PointerApi;

/// Orchestrates sends and reads across the content store and the pointer
/// index.  Generic over its two seams so the protocol can be tested
/// against doubles.
pub struct Coordinator<S, P> {
    me: UserId,
    store: S,
    api: P,
}

impl<S: ContentStore, P: PointerApi> Coordinator<S, P> {
    /// `me` must be the identity behind both the store's and the api's
    /// credentials; the server will attribute appended pointers to it.
    pub fn new(me: UserId, store: S, api: P) -> Self {
        Self { me, store, api }
    }

    pub fn user_id(&self) -> &UserId {
        &self.me
    }

    /// Send `text` to `to`.
    ///
    /// Content first, pointer second.  A failure before the pointer write
    /// means no message exists anywhere; a failure after the content write
    /// leaves an invisible orphan and reports the send as failed.  Either
    /// way the caller may retry the whole call.
    pub async fn send_message(
        &self,
        to: &UserId,
        text: &str,
    ) -> Result<DocumentRef, CoordinatorError> {
        let document = self.store.create_message(text).await?;
        debug!(document = %document.document_id, to = %to, "message body stored");

        self.api.append_pointer(to, &document).await?;
        debug!(document = %document.document_id, to = %to, "message pointer appended");

        Ok(document)
    }

    /// Load the conversation with `other`, oldest first.
    ///
    /// The result is materialized on every call and never cached.  A
    /// pointer whose document is missing from a successful fetch is a
    /// [`CoordinatorError::JoinIntegrity`] fault, not a message to drop.
    pub async fn get_conversation(
        &self,
        other: &UserId,
    ) -> Result<Vec<ChatMessage>, CoordinatorError> {
        let pointers = self.api.list_conversation(other).await?;

        // Distinct document ids, preserving first-seen order.
        let mut ids: Vec<DocumentId> = Vec::with_capacity(pointers.len());
        for pointer in &pointers {
            if !ids.contains(&pointer.document_id) {
                ids.push(pointer.document_id);
            }
        }

        let bodies = self.store.fetch_messages(&ids).await?;

        let mut messages = Vec::with_capacity(pointers.len());
        for pointer in pointers {
            let Some(body) = bodies.get(&pointer.document_id) else {
                return Err(CoordinatorError::JoinIntegrity {
                    document_id: pointer.document_id,
                });
            };
            messages.push(ChatMessage {
                id: pointer.document_id,
                from_user_id: pointer.from_user_id,
                to_user_id: pointer.to_user_id,
                text: body.message.clone(),
                timestamp: pointer.created_at,
            });
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use sotto_shared::protocol::MessagePointer;
    use sotto_shared::types::ContainerId;
    use sotto_vault::{MessageBody, VaultError};

    use crate::server_api::ApiError;

    // -- In-memory content store ------------------------------------------

    #[derive(Default)]
    struct StoreState {
        bodies: Mutex<HashMap<DocumentId, String>>,
        create_calls: AtomicU32,
        fetch_calls: AtomicU32,
        last_fetch_size: AtomicUsize,
        fail_create: AtomicBool,
    }

    #[derive(Clone)]
    struct MockStore {
        container: ContainerId,
        state: Arc<StoreState>,
    }

    #[async_trait]
    impl ContentStore for MockStore {
        async fn create_message(&self, text: &str) -> Result<DocumentRef, VaultError> {
            self.state.create_calls.fetch_add(1, Ordering::SeqCst);

            if self.state.fail_create.load(Ordering::SeqCst) {
                return Err(VaultError::Api {
                    status: 503,
                    message: "vault unavailable".to_string(),
                });
            }

            let document_id = DocumentId::new();
            self.state
                .bodies
                .lock()
                .unwrap()
                .insert(document_id, text.to_string());

            Ok(DocumentRef {
                container_id: self.container,
                document_id,
            })
        }

        async fn fetch_messages(
            &self,
            ids: &[DocumentId],
        ) -> Result<HashMap<DocumentId, MessageBody>, VaultError> {
            self.state.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.state
                .last_fetch_size
                .store(ids.len(), Ordering::SeqCst);

            let bodies = self.state.bodies.lock().unwrap();
            Ok(ids
                .iter()
                .filter_map(|id| {
                    bodies
                        .get(id)
                        .map(|text| (*id, MessageBody { message: text.clone() }))
                })
                .collect())
        }
    }

    // -- In-memory pointer index ------------------------------------------

    #[derive(Default)]
    struct ApiState {
        pointers: Mutex<Vec<MessagePointer>>,
        append_calls: AtomicU32,
        fail_append: AtomicBool,
    }

    /// One credential's view of the shared index, like the real API.
    #[derive(Clone)]
    struct MockApi {
        me: UserId,
        state: Arc<ApiState>,
    }

    #[async_trait]
    impl PointerApi for MockApi {
        async fn list_conversation(
            &self,
            other: &UserId,
        ) -> Result<Vec<MessagePointer>, ApiError> {
            let pointers = self.state.pointers.lock().unwrap();
            Ok(pointers
                .iter()
                .filter(|p| {
                    (p.from_user_id == self.me && p.to_user_id == *other)
                        || (p.from_user_id == *other && p.to_user_id == self.me)
                })
                .cloned()
                .collect())
        }

        async fn append_pointer(
            &self,
            to: &UserId,
            document: &DocumentRef,
        ) -> Result<(), ApiError> {
            self.state.append_calls.fetch_add(1, Ordering::SeqCst);

            if self.state.fail_append.load(Ordering::SeqCst) {
                return Err(ApiError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
            }

            self.state.pointers.lock().unwrap().push(MessagePointer {
                created_at: Utc::now(),
                from_user_id: self.me.clone(),
                to_user_id: to.clone(),
                container_id: document.container_id,
                document_id: document.document_id,
            });
            Ok(())
        }
    }

    // -- Harness -----------------------------------------------------------

    struct World {
        store_state: Arc<StoreState>,
        api_state: Arc<ApiState>,
        container: ContainerId,
    }

    impl World {
        fn new() -> Self {
            Self {
                store_state: Arc::new(StoreState::default()),
                api_state: Arc::new(ApiState::default()),
                container: ContainerId(Uuid::new_v4()),
            }
        }

        fn coordinator(&self, me: &str) -> Coordinator<MockStore, MockApi> {
            Coordinator::new(
                UserId::new(me),
                MockStore {
                    container: self.container,
                    state: self.store_state.clone(),
                },
                MockApi {
                    me: UserId::new(me),
                    state: self.api_state.clone(),
                },
            )
        }
    }

    // -- Tests --------------------------------------------------------------

    #[tokio::test]
    async fn send_then_read_round_trips_for_both_parties() {
        let world = World::new();
        let alice = world.coordinator("alice");
        let bob = world.coordinator("bob");

        alice
            .send_message(&UserId::new("bob"), "hello")
            .await
            .unwrap();

        let seen_by_alice = alice.get_conversation(&UserId::new("bob")).await.unwrap();
        assert_eq!(seen_by_alice.len(), 1);
        assert_eq!(seen_by_alice[0].text, "hello");
        assert_eq!(seen_by_alice[0].from_user_id, UserId::new("alice"));
        assert_eq!(seen_by_alice[0].to_user_id, UserId::new("bob"));

        bob.send_message(&UserId::new("alice"), "hi").await.unwrap();

        // Both parties read the same conversation, in send order.
        let seen_by_alice = alice.get_conversation(&UserId::new("bob")).await.unwrap();
        let seen_by_bob = bob.get_conversation(&UserId::new("alice")).await.unwrap();
        assert_eq!(seen_by_alice, seen_by_bob);
        assert_eq!(
            seen_by_alice
                .iter()
                .map(|m| m.text.as_str())
                .collect::<Vec<_>>(),
            vec!["hello", "hi"]
        );
    }

    #[tokio::test]
    async fn empty_conversation_reads_as_empty_not_as_an_error() {
        let world = World::new();
        let alice = world.coordinator("alice");

        let messages = alice.get_conversation(&UserId::new("bob")).await.unwrap();
        assert!(messages.is_empty());

        // The fetch step still ran, with nothing to fetch.
        assert_eq!(world.store_state.fetch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(world.store_state.last_fetch_size.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_message_conversation_fetches_exactly_one_document() {
        let world = World::new();
        let alice = world.coordinator("alice");

        alice
            .send_message(&UserId::new("bob"), "solo")
            .await
            .unwrap();

        let messages = alice.get_conversation(&UserId::new("bob")).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(world.store_state.last_fetch_size.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn join_preserves_index_order_across_many_documents() {
        let world = World::new();
        let alice = world.coordinator("alice");
        let bob = world.coordinator("bob");

        alice
            .send_message(&UserId::new("bob"), "one")
            .await
            .unwrap();
        bob.send_message(&UserId::new("alice"), "two")
            .await
            .unwrap();
        alice
            .send_message(&UserId::new("bob"), "three")
            .await
            .unwrap();

        let messages = alice.get_conversation(&UserId::new("bob")).await.unwrap();
        assert_eq!(
            messages.iter().map(|m| m.text.as_str()).collect::<Vec<_>>(),
            vec!["one", "two", "three"]
        );
        assert_eq!(world.store_state.last_fetch_size.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reading_twice_with_no_writes_is_idempotent() {
        let world = World::new();
        let alice = world.coordinator("alice");

        alice
            .send_message(&UserId::new("bob"), "hello")
            .await
            .unwrap();

        let first = alice.get_conversation(&UserId::new("bob")).await.unwrap();
        let second = alice.get_conversation(&UserId::new("bob")).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_content_write_aborts_before_any_pointer() {
        let world = World::new();
        world.store_state.fail_create.store(true, Ordering::SeqCst);
        let alice = world.coordinator("alice");

        let result = alice.send_message(&UserId::new("bob"), "lost").await;
        assert!(matches!(result, Err(CoordinatorError::ContentStore(_))));

        // The pointer api was never touched: no message half-exists.
        assert_eq!(world.api_state.append_calls.load(Ordering::SeqCst), 0);
        assert!(world.api_state.pointers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_pointer_append_leaves_an_invisible_orphan() {
        let world = World::new();
        world.api_state.fail_append.store(true, Ordering::SeqCst);
        let alice = world.coordinator("alice");

        let result = alice.send_message(&UserId::new("bob"), "orphan").await;
        assert!(matches!(result, Err(CoordinatorError::PointerApi(_))));

        // The body was written (step 1 completed)...
        assert_eq!(world.store_state.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(world.store_state.bodies.lock().unwrap().len(), 1);

        // ...but without a pointer it is invisible to every later read.
        world.api_state.fail_append.store(false, Ordering::SeqCst);
        let messages = alice.get_conversation(&UserId::new("bob")).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn retry_after_append_failure_never_duplicates_a_visible_message() {
        let world = World::new();
        let alice = world.coordinator("alice");

        world.api_state.fail_append.store(true, Ordering::SeqCst);
        assert!(alice
            .send_message(&UserId::new("bob"), "hello")
            .await
            .is_err());

        world.api_state.fail_append.store(false, Ordering::SeqCst);
        alice
            .send_message(&UserId::new("bob"), "hello")
            .await
            .unwrap();

        // One visible message; the first attempt's body is a dead orphan.
        let messages = alice.get_conversation(&UserId::new("bob")).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(world.store_state.bodies.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_document_is_an_integrity_fault_not_an_empty_read() {
        let world = World::new();
        let alice = world.coordinator("alice");

        let sent = alice
            .send_message(&UserId::new("bob"), "doomed")
            .await
            .unwrap();

        // Simulate store-side data loss behind a valid pointer.
        world
            .store_state
            .bodies
            .lock()
            .unwrap()
            .remove(&sent.document_id);

        let result = alice.get_conversation(&UserId::new("bob")).await;
        match result {
            Err(CoordinatorError::JoinIntegrity { document_id }) => {
                assert_eq!(document_id, sent.document_id);
            }
            other => panic!("expected a join integrity fault, got {other:?}"),
        }
    }
}
