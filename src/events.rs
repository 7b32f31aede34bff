use crate::error::DecodeError;
use alloy::primitives::{Log, B256};
use alloy::sol_types::SolEvent;

alloy::sol! {
    /// Events emitted by the Antibot contract, including the proxy and
    /// ownable machinery it is deployed behind.
    #[derive(Debug, PartialEq, Eq)]
    interface Antibot {
        event AntibotActiveChanged(address indexed token, bool active);
        event AuthorityChanged(address indexed target, address indexed user, bool authorized);
        event MarkedBlacklisted(address indexed token, address indexed account, bool isBlacklisted);
        event MarkedProtected(address indexed token, address indexed account, bool isProtected);
        event MarkedUnthrottled(address indexed token, address indexed account, bool isUnthrottled);
        event MarkedWhitelisted(address indexed token, address indexed account, bool isWhitelisted);
        event MaxTransferAmountChanged(address indexed token, uint256 maxTransferAmount);
        event TradingStartChanged(address indexed token, uint256 tradingStart);

        event AdminChanged(address previousAdmin, address newAdmin);
        event BeaconUpgraded(address indexed beacon);
        event Initialized(uint8 version);
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);
        event Upgraded(address indexed implementation);
    }
}

/// Closed set of event shapes the reconciler accepts, one variant per
/// contract event. Administrative variants are acknowledged and ignored
/// downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AntibotEvent {
    AntibotActiveChanged(Antibot::AntibotActiveChanged),
    AuthorityChanged(Antibot::AuthorityChanged),
    MarkedBlacklisted(Antibot::MarkedBlacklisted),
    MarkedProtected(Antibot::MarkedProtected),
    MarkedUnthrottled(Antibot::MarkedUnthrottled),
    MarkedWhitelisted(Antibot::MarkedWhitelisted),
    MaxTransferAmountChanged(Antibot::MaxTransferAmountChanged),
    TradingStartChanged(Antibot::TradingStartChanged),
    AdminChanged(Antibot::AdminChanged),
    BeaconUpgraded(Antibot::BeaconUpgraded),
    Initialized(Antibot::Initialized),
    OwnershipTransferred(Antibot::OwnershipTransferred),
    Upgraded(Antibot::Upgraded),
}

impl AntibotEvent {
    /// Decode a raw log into a typed event. A log whose topic0 is not one of
    /// the contract's signatures decodes to `None` (foreign logs are
    /// skipped); a recognized topic0 with a malformed body is an error.
    pub fn decode(log: &Log) -> Result<Option<Self>, DecodeError> {
        let Some(topic0) = log.data.topics().first().copied() else {
            return Ok(None);
        };
        let event = if topic0 == Antibot::AntibotActiveChanged::SIGNATURE_HASH {
            Self::AntibotActiveChanged(decode_body(log)?)
        } else if topic0 == Antibot::AuthorityChanged::SIGNATURE_HASH {
            Self::AuthorityChanged(decode_body(log)?)
        } else if topic0 == Antibot::MarkedBlacklisted::SIGNATURE_HASH {
            Self::MarkedBlacklisted(decode_body(log)?)
        } else if topic0 == Antibot::MarkedProtected::SIGNATURE_HASH {
            Self::MarkedProtected(decode_body(log)?)
        } else if topic0 == Antibot::MarkedUnthrottled::SIGNATURE_HASH {
            Self::MarkedUnthrottled(decode_body(log)?)
        } else if topic0 == Antibot::MarkedWhitelisted::SIGNATURE_HASH {
            Self::MarkedWhitelisted(decode_body(log)?)
        } else if topic0 == Antibot::MaxTransferAmountChanged::SIGNATURE_HASH {
            Self::MaxTransferAmountChanged(decode_body(log)?)
        } else if topic0 == Antibot::TradingStartChanged::SIGNATURE_HASH {
            Self::TradingStartChanged(decode_body(log)?)
        } else if topic0 == Antibot::AdminChanged::SIGNATURE_HASH {
            Self::AdminChanged(decode_body(log)?)
        } else if topic0 == Antibot::BeaconUpgraded::SIGNATURE_HASH {
            Self::BeaconUpgraded(decode_body(log)?)
        } else if topic0 == Antibot::Initialized::SIGNATURE_HASH {
            Self::Initialized(decode_body(log)?)
        } else if topic0 == Antibot::OwnershipTransferred::SIGNATURE_HASH {
            Self::OwnershipTransferred(decode_body(log)?)
        } else if topic0 == Antibot::Upgraded::SIGNATURE_HASH {
            Self::Upgraded(decode_body(log)?)
        } else {
            return Ok(None);
        };
        Ok(Some(event))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AntibotActiveChanged(_) => "AntibotActiveChanged",
            Self::AuthorityChanged(_) => "AuthorityChanged",
            Self::MarkedBlacklisted(_) => "MarkedBlacklisted",
            Self::MarkedProtected(_) => "MarkedProtected",
            Self::MarkedUnthrottled(_) => "MarkedUnthrottled",
            Self::MarkedWhitelisted(_) => "MarkedWhitelisted",
            Self::MaxTransferAmountChanged(_) => "MaxTransferAmountChanged",
            Self::TradingStartChanged(_) => "TradingStartChanged",
            Self::AdminChanged(_) => "AdminChanged",
            Self::BeaconUpgraded(_) => "BeaconUpgraded",
            Self::Initialized(_) => "Initialized",
            Self::OwnershipTransferred(_) => "OwnershipTransferred",
            Self::Upgraded(_) => "Upgraded",
        }
    }
}

/// Full topic0 filter set for log subscription.
pub fn antibot_event_topics() -> Vec<B256> {
    vec![
        Antibot::AntibotActiveChanged::SIGNATURE_HASH,
        Antibot::AuthorityChanged::SIGNATURE_HASH,
        Antibot::MarkedBlacklisted::SIGNATURE_HASH,
        Antibot::MarkedProtected::SIGNATURE_HASH,
        Antibot::MarkedUnthrottled::SIGNATURE_HASH,
        Antibot::MarkedWhitelisted::SIGNATURE_HASH,
        Antibot::MaxTransferAmountChanged::SIGNATURE_HASH,
        Antibot::TradingStartChanged::SIGNATURE_HASH,
        Antibot::AdminChanged::SIGNATURE_HASH,
        Antibot::BeaconUpgraded::SIGNATURE_HASH,
        Antibot::Initialized::SIGNATURE_HASH,
        Antibot::OwnershipTransferred::SIGNATURE_HASH,
        Antibot::Upgraded::SIGNATURE_HASH,
    ]
}

fn decode_body<E: SolEvent>(log: &Log) -> Result<E, DecodeError> {
    E::decode_log_data(&log.data, true).map_err(|err| DecodeError::MalformedLog {
        signature: E::SIGNATURE,
        reason: err.to_string(),
    })
}
