//! Conversions between the provider's types and the workspace's

use common::types::{
    chain::BlockNumber,
    events::{ContractEvent, EventFilter},
};
use starknet::core::types::{
    BlockId as CoreBlockId, EmittedEvent, EventFilter as CoreEventFilter, FieldElement,
};

/// Render a field element in canonical hex form
pub(crate) fn felt_to_hex(felt: &FieldElement) -> String {
    format!("{felt:#x}")
}

/// Build the provider's filter for a block range of one contract's events
pub(crate) fn to_core_filter(filter: &EventFilter) -> CoreEventFilter {
    CoreEventFilter {
        from_block: Some(block_id(filter.from_block)),
        to_block: Some(block_id(filter.to_block)),
        address: Some(filter.address.felt()),
        keys: None,
    }
}

/// Refer to a block by its number
fn block_id(block: BlockNumber) -> CoreBlockId {
    CoreBlockId::Number(block)
}

/// Convert an event emitted on chain into the workspace's event type
pub(crate) fn to_contract_event(event: EmittedEvent) -> ContractEvent {
    ContractEvent {
        from_address: felt_to_hex(&event.from_address),
        keys: event.keys.iter().map(felt_to_hex).collect(),
        data: event.data.iter().map(felt_to_hex).collect(),
        block_number: event.block_number,
        transaction_hash: Some(felt_to_hex(&event.transaction_hash)),
    }
}
