use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use borsh::BorshDeserialize;
use regex::Regex;
use solana_sdk::pubkey::Pubkey;
use std::sync::OnceLock;

const POOL_INIT_MARKER: &str = "initialize2:";
const RAY_LOG_MARKER: &str = "ray_log:";

/// `ray_log` event tag of the pool initialisation record
const RAY_LOG_INIT: u8 = 0;

const PC_AMOUNT_PATTERN: &str = r"init_pc_amount:\s*(\d+)";
const COIN_AMOUNT_PATTERN: &str = r"init_coin_amount:\s*(\d+)";
const OPEN_TIME_PATTERN: &str = r"open_time:\s*(\d+)";

/// Pool facts recoverable from log text alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFacts {
    /// Quote side amount deposited at creation
    pub init_pc_amount: Option<u64>,
    /// Base side amount deposited at creation
    pub init_coin_amount: Option<u64>,
    /// Unix time the pool opens for trading
    pub open_time: Option<u64>,
    pub init_record: Option<InitRecord>,
}

impl LogFacts {
    pub fn has_amounts(&self) -> bool {
        self.init_pc_amount.is_some() || self.init_coin_amount.is_some()
    }

    /// OpenBook market the pool was created against, known only from `ray_log`
    pub fn market(&self) -> Option<Pubkey> {
        self.init_record.as_ref().map(InitRecord::market)
    }
}

/// The binary `ray_log` record the AMM emits when a pool is initialised
#[derive(Debug, Clone, PartialEq, BorshDeserialize)]
pub struct InitRecord {
    pub log_type: u8,
    pub time: u64,
    pub pc_decimals: u8,
    pub coin_decimals: u8,
    pub pc_lot_size: u64,
    pub coin_lot_size: u64,
    pub pc_amount: u64,
    pub coin_amount: u64,
    pub market: [u8; 32],
}

impl InitRecord {
    pub fn market(&self) -> Pubkey {
        Pubkey::new_from_array(self.market)
    }
}

fn field_regex(slot: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    slot.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn numeric_field(line: &str, slot: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<u64> {
    field_regex(slot, pattern)?
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Decode the payload after `ray_log:` when it is an init record
pub fn decode_init_record(line: &str) -> Option<InitRecord> {
    let encoded = line.split(RAY_LOG_MARKER).nth(1)?.trim();
    let bytes = STANDARD.decode(encoded).ok()?;
    if bytes.first() != Some(&RAY_LOG_INIT) {
        return None;
    }
    InitRecord::deserialize(&mut bytes.as_slice()).ok()
}

/// Scan program logs line by line for the pool initialisation facts.
///
/// Amounts come from the `initialize2:` text when present and from the
/// `ray_log` init record otherwise.
pub fn parse_logs(lines: &[String]) -> LogFacts {
    static PC: OnceLock<Option<Regex>> = OnceLock::new();
    static COIN: OnceLock<Option<Regex>> = OnceLock::new();
    static OPEN: OnceLock<Option<Regex>> = OnceLock::new();

    let mut facts = LogFacts::default();

    for line in lines {
        if line.contains(POOL_INIT_MARKER) {
            if let Some(pc) = numeric_field(line, &PC, PC_AMOUNT_PATTERN) {
                facts.init_pc_amount = Some(pc);
            }
            if let Some(coin) = numeric_field(line, &COIN, COIN_AMOUNT_PATTERN) {
                facts.init_coin_amount = Some(coin);
            }
            if let Some(open) = numeric_field(line, &OPEN, OPEN_TIME_PATTERN) {
                facts.open_time = Some(open);
            }
        }

        if line.contains(RAY_LOG_MARKER) && facts.init_record.is_none() {
            facts.init_record = decode_init_record(line);
        }
    }

    if let Some(record) = &facts.init_record {
        facts.init_pc_amount = facts.init_pc_amount.or(Some(record.pc_amount));
        facts.init_coin_amount = facts.init_coin_amount.or(Some(record.coin_amount));
        facts.open_time = facts.open_time.or(Some(record.time));
    }

    facts
}
