//! Network message types for Strata node-to-node communication.

pub mod codec;
pub mod error;

use serde::{Deserialize, Serialize};
use strata_ledger::BlockNotification;
use strata_transactions::{ProcessedTransaction, SignedTransaction};
use strata_types::NetworkId;

pub use codec::{decode, encode, MAX_MESSAGE_SIZE};
pub use error::CodecError;

/// Current wire protocol version.
pub const PROTOCOL_VERSION: u16 = 1;

/// Header present on every network message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    pub network: NetworkId,
    pub protocol_version: u16,
}

impl MessageHeader {
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

/// All messages exchanged between nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireMessage {
    /// Client transaction not yet stamped; the receiving node stamps it.
    SubmitTransaction(SignedTransaction),
    /// Stamped transaction relayed so every node queues it under the same HLC timestamp.
    TransactionIntent(ProcessedTransaction),
    /// A block became durable on its owner.
    BlockNotification(BlockNotification),
}

impl WireMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubmitTransaction(_) => "submit_transaction",
            Self::TransactionIntent(_) => "transaction_intent",
            Self::BlockNotification(_) => "block_notification",
        }
    }
}

/// A message plus its header, as sent on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub header: MessageHeader,
    pub message: WireMessage,
}
