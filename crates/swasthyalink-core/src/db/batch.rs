//! Atomic write batches.

use tracing::debug;

use super::{Database, DbResult};
use crate::models::{FamilyMember, RequestStatus};

/// One write in a [`WriteBatch`].
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Append a member to a network, creating the network if needed
    AppendMember {
        network_uid: String,
        member: FamilyMember,
    },
    /// Move a pending request to a terminal status
    ResolveRequest {
        request_id: String,
        status: RequestStatus,
        responded_at: String,
    },
}

/// Ordered writes applied all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_member(&mut self, network_uid: impl Into<String>, member: FamilyMember) {
        self.ops.push(WriteOp::AppendMember {
            network_uid: network_uid.into(),
            member,
        });
    }

    pub fn resolve_request(
        &mut self,
        request_id: impl Into<String>,
        status: RequestStatus,
        responded_at: impl Into<String>,
    ) {
        self.ops.push(WriteOp::ResolveRequest {
            request_id: request_id.into(),
            status,
            responded_at: responded_at.into(),
        });
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Database {
    /// Apply every write in one transaction. Any failure rolls back all of them.
    pub fn commit_batch(&self, batch: &WriteBatch) -> DbResult<()> {
        debug!(writes = batch.len(), "Committing write batch");
        self.atomically(|db| {
            for op in batch.ops() {
                match op {
                    WriteOp::AppendMember {
                        network_uid,
                        member,
                    } => db.append_member(network_uid, member)?,
                    WriteOp::ResolveRequest {
                        request_id,
                        status,
                        responded_at,
                    } => db.resolve_request(request_id, *status, responded_at)?,
                }
            }
            Ok(())
        })
    }
}
