use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed view over a `getTransaction` result fetched with `jsonParsed` encoding.
///
/// Only the fields the extractor reads are modelled; the full JSON is kept in
/// `raw` so it can be stored alongside the discovered pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    #[serde(default)]
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    pub transaction: TransactionBody,
    #[serde(default)]
    pub meta: Option<TransactionMeta>,
    #[serde(skip)]
    pub raw: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionBody {
    pub message: ParsedMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedMessage {
    #[serde(default)]
    pub account_keys: Vec<AccountKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountKey {
    pub pubkey: String,
    #[serde(default)]
    pub signer: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub post_token_balances: Option<Vec<TokenBalance>>,
    #[serde(default)]
    pub inner_instructions: Option<Vec<InnerInstructionGroup>>,
}

/// One entry of `meta.postTokenBalances`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    #[serde(default)]
    pub account_index: u32,
    pub mint: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub ui_token_amount: UiAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiAmount {
    pub amount: String,
    pub decimals: u8,
}

impl TokenBalance {
    /// Raw amount; an unparsable amount reads as zero
    pub fn raw_amount(&self) -> u64 {
        self.ui_token_amount.amount.parse().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnerInstructionGroup {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub instructions: Vec<InnerInstruction>,
}

/// An inner instruction, either parsed by the node or left as raw accounts/data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InnerInstruction {
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub parsed: Option<Value>,
}

impl InnerInstruction {
    fn info_field(&self, field: &str) -> Option<&str> {
        self.parsed.as_ref()?.get("info")?.get(field)?.as_str()
    }

    /// `parsed.info.owner`: the program that will own the referenced account
    pub fn owner(&self) -> Option<&str> {
        self.info_field("owner")
    }

    /// `parsed.info.account`
    pub fn account(&self) -> Option<&str> {
        self.info_field("account")
    }
}

impl ParsedTransaction {
    /// Build the typed view and keep the original JSON as the snapshot
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let mut tx: ParsedTransaction = serde_json::from_value(value.clone())?;
        tx.raw = value;
        Ok(tx)
    }

    /// Execution error reported in the metadata, if any
    pub fn execution_error(&self) -> Option<&Value> {
        self.meta.as_ref()?.err.as_ref().filter(|err| !err.is_null())
    }

    /// First account key, the fee payer / signer
    pub fn signer(&self) -> Option<&str> {
        self.transaction.message.account_keys.first().map(|key| key.pubkey.as_str())
    }

    pub fn post_token_balances(&self) -> &[TokenBalance] {
        self.meta.as_ref()
            .and_then(|meta| meta.post_token_balances.as_deref())
            .unwrap_or(&[])
    }

    pub fn inner_instructions(&self) -> &[InnerInstructionGroup] {
        self.meta.as_ref()
            .and_then(|meta| meta.inner_instructions.as_deref())
            .unwrap_or(&[])
    }
}
