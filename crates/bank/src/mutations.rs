//! Paged retrieval of account mutations.
//!
//! `/mutations/{iban}` returns the newest page first together with a
//! `lastMutationKey`; passing that key back yields the next, older page.

use std::collections::HashSet;

use abnamro_core::serde_helpers::string_or_number;
use abnamro_core::{DateRange, Error, Result, Transaction, TransactionStream};
use futures::{stream, StreamExt, TryStreamExt};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::transactions::AccountTransaction;
use crate::BankSession;

const SERVICE_VERSION_HEADER: &str = "x-aab-serviceversion";
const MUTATIONS_SERVICE_VERSION: &str = "v3";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationsResponse {
    #[serde(default)]
    mutations_list: MutationsList,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationsList {
    #[serde(default, deserialize_with = "string_or_number")]
    last_mutation_key: Option<String>,
    #[serde(default)]
    mutations: Vec<Value>,
}

/// One page of mutations.
#[derive(Debug, Default)]
pub struct MutationPage {
    pub transactions: Vec<AccountTransaction>,
    /// Key of the next (older) page, if any.
    pub last_mutation_key: Option<String>,
}

/// Parses a single `mutations[]` entry, `None` when it is unusable.
fn parse_mutation(entry: Value) -> Option<AccountTransaction> {
    let mutation = match entry {
        Value::Object(mut map) => map.remove("mutation")?,
        _ => return None,
    };
    match serde_json::from_value(mutation) {
        Ok(transaction) => Some(transaction),
        Err(e) => {
            warn!("[AbnAmro] Skipping malformed mutation: {}", e);
            None
        }
    }
}

/// Fetches one page of mutations for `iban`.
pub async fn fetch_page(
    session: &BankSession,
    iban: &str,
    last_mutation_key: Option<&str>,
) -> Result<MutationPage> {
    let path = format!("/mutations/{}", iban);
    let query: Vec<(&str, &str)> = last_mutation_key
        .map(|key| vec![("lastMutationKey", key)])
        .unwrap_or_default();
    let response: MutationsResponse = session
        .get_json(
            &path,
            &query,
            &[(SERVICE_VERSION_HEADER, MUTATIONS_SERVICE_VERSION)],
        )
        .await?;

    let list = response.mutations_list;
    let received = list.mutations.len();
    let transactions: Vec<AccountTransaction> =
        list.mutations.into_iter().filter_map(parse_mutation).collect();
    if transactions.len() < received {
        warn!(
            "[AbnAmro] {} of {} mutations could not be parsed",
            received - transactions.len(),
            received
        );
    }
    debug!(
        "[AbnAmro] Fetched {} mutations for {}",
        transactions.len(),
        iban
    );

    Ok(MutationPage {
        transactions,
        last_mutation_key: list.last_mutation_key.filter(|key| !key.is_empty()),
    })
}

enum Cursor {
    First,
    After(String),
    Exhausted,
}

/// Every mutation of `iban`, newest first, fetched page by page.
///
/// Paging ends when the portal sends no key or one it already sent.
pub fn mutation_stream<'a>(
    session: &'a BankSession,
    iban: &'a str,
) -> TransactionStream<'a, AccountTransaction> {
    let state = (Cursor::First, HashSet::new());
    stream::try_unfold(state, move |(cursor, mut seen)| async move {
        let key = match &cursor {
            Cursor::First => None,
            Cursor::After(key) => Some(key.as_str()),
            Cursor::Exhausted => return Ok::<_, Error>(None),
        };
        let page = fetch_page(session, iban, key).await?;
        let next = match page.last_mutation_key {
            Some(next) if !seen.insert(next.clone()) => {
                warn!(
                    "[AbnAmro] Mutation key {} repeated for {}, stopping pagination",
                    next, iban
                );
                Cursor::Exhausted
            }
            Some(next) => Cursor::After(next),
            None => Cursor::Exhausted,
        };
        let items = stream::iter(page.transactions.into_iter().map(Ok::<_, Error>));
        Ok(Some((items, (next, seen))))
    })
    .try_flatten()
    .boxed()
}

/// Mutations of `iban` whose transaction date lies within `range`.
///
/// Pages arrive in booking order, newest first, so retrieval stops at the
/// first mutation booked before the start of the range. A mutation without
/// a book date falls back to its transaction date.
pub async fn mutations_in_range(
    session: &BankSession,
    iban: &str,
    range: DateRange,
) -> Result<Vec<AccountTransaction>> {
    let mut found = Vec::new();
    let mut mutations = mutation_stream(session, iban);
    while let Some(transaction) = mutations.try_next().await? {
        if let Some(booked) = transaction.book_date().or(transaction.transaction_date()) {
            if booked < range.start {
                debug!("[AbnAmro] Reached {} before {}, stopping", booked, range.start);
                break;
            }
        }
        if transaction
            .transaction_date()
            .is_some_and(|date| range.contains(date))
        {
            found.push(transaction);
        }
    }
    Ok(found)
}
