//! Integration tests: YAML listings → ordered collection → pages and tokens
//!
//! Walks real listings forward and backward through tokens, the way a web
//! client would, and checks that every record is shown exactly once.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use flow_pager::{
    load_config_from_str, Collection, Config, Error, KeyFilter, KeyPath, KeyValue,
    KeysetPaginator, MemoryCollection, Page, PageToken, Record, SortKey,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;

const CRM_YAML: &str = r"
models:
  - name: User
    ordering: [username]
    fields:
      - { name: username, kind: scalar, type: text }
  - name: Contact
    ordering: [last_name]
    fields:
      - { name: last_name, kind: scalar, type: text }
      - { name: rank, kind: scalar, type: integer, nullable: true }
      - { name: birthday, kind: scalar, type: date, nullable: true }
      - { name: modified, kind: scalar, type: datetime }
      - { name: budget, kind: scalar, type: decimal }
      - { name: user, kind: to_one, model: User, nullable: true }
listings:
  by_rank:
    model: Contact
    key: -rank
    per_page: 3
  by_rank_ascending:
    model: Contact
    key: rank
    per_page: 3
  by_owner:
    model: Contact
    key: user
    per_page: 3
  by_birthday:
    model: Contact
    key: birthday
    per_page: 3
  recently_modified:
    model: Contact
    key: -modified
    per_page: 3
  by_budget:
    model: Contact
    key: budget
    per_page: 3
";

// ============================================================================
// Fixtures
// ============================================================================

#[derive(Debug, Clone)]
struct User {
    username: String,
}

#[derive(Debug, Clone)]
struct Contact {
    id: u32,
    last_name: String,
    rank: Option<i64>,
    birthday: Option<NaiveDate>,
    modified: DateTime<Utc>,
    budget: Decimal,
    user: Option<User>,
}

impl Record for Contact {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }

    fn value_at(&self, path: &KeyPath) -> KeyValue {
        let segments: Vec<&str> = path.segments().iter().map(String::as_str).collect();
        match segments.as_slice() {
            ["last_name"] => self.last_name.as_str().into(),
            ["rank"] => self.rank.into(),
            ["birthday"] => self.birthday.into(),
            ["modified"] => self.modified.into(),
            ["budget"] => self.budget.into(),
            ["user", "username"] => self.user.as_ref().map(|u| u.username.clone()).into(),
            _ => KeyValue::Null,
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

fn contact(
    id: u32,
    last_name: &str,
    rank: Option<i64>,
    birthday: Option<NaiveDate>,
    budget: &str,
    username: Option<&str>,
) -> Contact {
    let base = Utc.with_ymd_and_hms(2016, 3, 9, 12, 0, 0).unwrap();
    Contact {
        id,
        last_name: last_name.to_string(),
        rank,
        birthday,
        modified: base + Duration::minutes(10 * i64::from(id - 1)),
        budget: Decimal::from_str(budget).unwrap(),
        user: username.map(|username| User {
            username: username.to_string(),
        }),
    }
}

fn contacts() -> Vec<Contact> {
    vec![
        contact(1, "Spiegel", Some(3), date(1980, 1, 5), "12.50", Some("kirika")),
        contact(2, "Wong", None, None, "0.10", None),
        contact(3, "Adams", Some(3), date(1980, 1, 5), "7.25", Some("mireille")),
        contact(4, "Black", Some(1), date(1975, 6, 30), "7.25", Some("kirika")),
        contact(5, "Faye", None, date(1990, 12, 24), "100", None),
        contact(6, "Lee", Some(3), None, "12.50", Some("mireille")),
        contact(7, "Ikari", Some(2), date(1980, 1, 5), "7.25", Some("kirika")),
        contact(8, "Soryu", Some(5), date(2001, 12, 4), "3.1", None),
        contact(9, "Katsuragi", Some(3), date(1986, 12, 8), "45.00", Some("misato")),
        contact(10, "Kaji", None, None, "0.10", Some("misato")),
    ]
}

fn config() -> Config {
    load_config_from_str(CRM_YAML).unwrap()
}

fn listing<C>(config: &Config, name: &str, collection: C) -> KeysetPaginator<C>
where
    C: Collection,
{
    let schema = config.schema().unwrap();
    let listing = config.listing(name).unwrap();
    let count = collection.count().unwrap();
    KeysetPaginator::from_config(collection, &schema, listing, count).unwrap()
}

/// Paginator over `contacts()`, ordered along the listing key
fn contact_listing(name: &str) -> KeysetPaginator<MemoryCollection<Contact>> {
    let config = config();
    let listing_config = config.listing(name).unwrap();
    let key = SortKey::resolve(
        &config.schema().unwrap(),
        &listing_config.model,
        &listing_config.key,
    )
    .unwrap();
    let collection = MemoryCollection::ordered_by(contacts(), &key).unwrap();
    listing(&config, name, collection)
}

fn ids<C>(page: &Page<'_, C>) -> Vec<u32>
where
    C: Collection<Record = Contact>,
{
    page.iter().map(|c| c.id).collect()
}

fn forward_walk(paginator: &KeysetPaginator<MemoryCollection<Contact>>) -> Vec<Vec<u32>> {
    paginator.pages().map(|page| ids(&page.unwrap())).collect()
}

// ============================================================================
// Null Ordering
// ============================================================================

#[test]
fn test_descending_key_puts_nulls_last() {
    let paginator = contact_listing("by_rank");
    assert_eq!(
        forward_walk(&paginator),
        vec![vec![8, 1, 3], vec![6, 9, 7], vec![4, 2, 5], vec![10]]
    );
}

#[test]
fn test_ascending_key_puts_nulls_first() {
    let paginator = contact_listing("by_rank_ascending");
    assert_eq!(
        forward_walk(&paginator),
        vec![vec![2, 5, 10], vec![4, 7, 1], vec![3, 6, 9], vec![8]]
    );
}

#[test]
fn test_null_boundary_tokens() {
    let paginator = contact_listing("by_rank");

    let first = paginator.page(None).unwrap();
    let second = paginator.page(first.next_token().unwrap().as_ref()).unwrap();
    let third = paginator.page(second.next_token().unwrap().as_ref()).unwrap();

    // Two null ranks already shown on the third page
    let token = third.next_token().unwrap().unwrap();
    assert_eq!(token, PageToken::forward("-rank", json!(null), 2));

    // The token survives its string form, null included
    let token = PageToken::decode(&token.encode()).unwrap();
    assert_eq!(ids(&paginator.page(Some(&token)).unwrap()), vec![10]);
}

#[test]
fn test_backward_walk_from_the_last_page() {
    let paginator = contact_listing("by_rank");

    let last = paginator.last_page().unwrap();
    assert_eq!(ids(&last), vec![2, 5, 10]);
    assert!(!last.has_next());

    let token = last.previous_token().unwrap().unwrap();
    assert_eq!(token, PageToken::backward("-rank", json!(null), 2));
    let page = paginator.page(Some(&token)).unwrap();
    assert_eq!(ids(&page), vec![9, 7, 4]);
    assert_eq!(page.next_item().map(|c| c.id), Some(2));

    let token = page.previous_token().unwrap().unwrap();
    let page = paginator.page(Some(&token)).unwrap();
    assert_eq!(ids(&page), vec![1, 3, 6]);

    // Only contact 8 is left before: the client goes back to the first page
    let token = page.previous_token().unwrap().unwrap();
    assert_eq!(token, PageToken::backward("-rank", json!(3), 3));
    let err = paginator.page(Some(&token)).unwrap_err();
    assert!(matches!(err, Error::StartOfSequence));
    assert!(err.is_boundary());

    assert_eq!(ids(&paginator.page(None).unwrap()), vec![8, 1, 3]);
}

#[test]
fn test_second_page_leads_back_to_the_first_page() {
    let paginator = contact_listing("by_rank_ascending");
    let first = paginator.page(None).unwrap();
    let second = paginator.page(first.next_token().unwrap().as_ref()).unwrap();

    let token = second.previous_token().unwrap().unwrap();
    assert!(matches!(paginator.page(Some(&token)), Err(Error::StartOfSequence)));
}

// ============================================================================
// Key Types
// ============================================================================

#[test]
fn test_relation_key_uses_related_ordering() {
    let paginator = contact_listing("by_owner");
    assert_eq!(paginator.key(), "user");
    assert!(paginator.sort_key().attr_path().matches("user.username"));

    let first = paginator.page(None).unwrap();
    assert_eq!(ids(&first), vec![2, 5, 8]);
    assert_eq!(
        first.next_token().unwrap(),
        Some(PageToken::forward("user", json!("kirika"), 0))
    );

    assert_eq!(
        forward_walk(&paginator),
        vec![vec![2, 5, 8], vec![1, 4, 7], vec![3, 6, 9], vec![10]]
    );
}

#[test]
fn test_date_key_tokens() {
    let paginator = contact_listing("by_birthday");

    let first = paginator.page(None).unwrap();
    assert_eq!(ids(&first), vec![2, 6, 10]);
    let token = first.next_token().unwrap().unwrap();
    assert_eq!(token, PageToken::forward("birthday", json!("1975-06-30"), 0));

    let second = paginator.page(Some(&token)).unwrap();
    assert_eq!(ids(&second), vec![4, 1, 3]);
    assert_eq!(
        second.next_token().unwrap(),
        Some(PageToken::forward("birthday", json!("1980-01-05"), 2))
    );

    let all: Vec<u32> = forward_walk(&paginator).concat();
    assert_eq!(all, vec![2, 6, 10, 4, 1, 3, 7, 9, 5, 8]);
}

#[test]
fn test_datetime_key_tokens() {
    let paginator = contact_listing("recently_modified");

    let first = paginator.page(None).unwrap();
    assert_eq!(ids(&first), vec![10, 9, 8]);

    let token = first.next_token().unwrap().unwrap();
    assert_eq!(
        token,
        PageToken::forward("-modified", json!("2016-03-09T13:00:00.000000000Z"), 0)
    );

    let token = PageToken::decode(&token.encode()).unwrap();
    assert_eq!(ids(&paginator.page(Some(&token)).unwrap()), vec![7, 6, 5]);
}

#[test]
fn test_datetime_token_accepts_rfc3339() {
    let paginator = contact_listing("recently_modified");
    let token = PageToken::forward("-modified", json!("2016-03-09T15:00:00+02:00"), 0);
    assert_eq!(ids(&paginator.page(Some(&token)).unwrap()), vec![7, 6, 5]);
}

#[test]
fn test_decimal_key_tokens_are_exact() {
    let paginator = contact_listing("by_budget");

    let first = paginator.page(None).unwrap();
    assert_eq!(ids(&first), vec![2, 10, 8]);
    assert_eq!(
        first.next_token().unwrap(),
        Some(PageToken::forward("budget", json!("7.25"), 0))
    );

    let second = paginator.page(first.next_token().unwrap().as_ref()).unwrap();
    assert_eq!(ids(&second), vec![3, 4, 7]);
    assert_eq!(
        second.next_token().unwrap(),
        Some(PageToken::forward("budget", json!("12.50"), 0))
    );

    let all: Vec<u32> = forward_walk(&paginator).concat();
    assert_eq!(all, vec![2, 10, 8, 3, 4, 7, 1, 6, 9, 5]);
}

#[test]
fn test_token_of_another_listing_is_rejected() {
    let by_rank = contact_listing("by_rank");
    let by_budget = contact_listing("by_budget");

    let token = by_rank.page(None).unwrap().next_token().unwrap().unwrap();
    let err = by_budget.page(Some(&token)).unwrap_err();
    assert!(err.is_invalid_token());
}

// ============================================================================
// Store Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
#[error("store unavailable")]
struct StoreUnavailable;

/// Store whose range queries always fail
#[derive(Debug, Clone)]
struct UnavailableStore {
    inner: MemoryCollection<Contact>,
}

impl Collection for UnavailableStore {
    type Record = Contact;
    type Error = StoreUnavailable;

    fn count(&self) -> Result<usize, StoreUnavailable> {
        Ok(self.inner.len())
    }

    fn filter(&self, _path: &KeyPath, _filter: &KeyFilter) -> Result<Self, StoreUnavailable> {
        Err(StoreUnavailable)
    }

    fn reverse(&self) -> Self {
        Self {
            inner: self.inner.reverse(),
        }
    }

    fn slice(&self, start: usize, stop: usize) -> Result<Vec<Contact>, StoreUnavailable> {
        self.inner.slice(start, stop).map_err(|_| StoreUnavailable)
    }
}

#[test]
fn test_store_errors_reach_the_caller() {
    let config = config();
    let inner = MemoryCollection::from_ordered(contacts());
    let paginator = listing(&config, "by_rank", UnavailableStore { inner });

    // No range query needed for the first and last pages
    let first = paginator.page(None).unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(paginator.last_page().unwrap().len(), 3);

    let err = paginator.page(first.next_token().unwrap().as_ref()).unwrap_err();
    assert_eq!(err.to_string(), "store unavailable");
    assert!(!err.is_boundary());
    assert!(err
        .collection_source()
        .and_then(|source| source.downcast_ref::<StoreUnavailable>())
        .is_some());
}

// ============================================================================
// Properties
// ============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    struct Row {
        id: u32,
        rank: Option<i64>,
    }

    impl Record for Row {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }

        fn value_at(&self, _path: &KeyPath) -> KeyValue {
            self.rank.into()
        }
    }

    type RowPaginator = KeysetPaginator<MemoryCollection<Row>>;

    /// Few distinct ranks, so that runs of duplicates span pages
    fn scenario() -> impl Strategy<Value = (Vec<Option<i64>>, usize, bool)> {
        (
            prop::collection::vec(prop::option::weighted(0.8, 0i64..4), 0..40),
            2usize..6,
            any::<bool>(),
        )
    }

    fn build(ranks: &[Option<i64>], per_page: usize, descending: bool) -> (Vec<u32>, RowPaginator) {
        let key = if descending { "-rank" } else { "rank" };
        let key = SortKey::for_field(key, flow_pager::FieldType::Integer, true).unwrap();
        let rows = ranks
            .iter()
            .zip(1..)
            .map(|(rank, id)| Row { id, rank: *rank })
            .collect();
        let collection = MemoryCollection::ordered_by(rows, &key).unwrap();
        let ordered = collection.records().iter().map(|r| r.id).collect();
        (ordered, KeysetPaginator::counted(collection, key, per_page).unwrap())
    }

    fn row_ids(page: &Page<'_, MemoryCollection<Row>>) -> Vec<u32> {
        page.iter().map(|r| r.id).collect()
    }

    proptest! {
        #[test]
        fn float_boundaries_survive_the_token(x in any::<f64>().prop_filter("finite", |x| x.is_finite())) {
            let token = PageToken::forward("score", KeyValue::Float(x).to_token_value(), 0);
            let decoded = PageToken::decode(&token.encode()).unwrap();
            prop_assert_eq!(&decoded, &token);

            let value = flow_pager::FieldType::Float
                .decode_token_value(decoded.value.as_ref().unwrap())
                .unwrap();
            match value {
                KeyValue::Float(y) => prop_assert_eq!(y.to_bits(), x.to_bits()),
                other => prop_assert!(false, "decoded as {:?}", other),
            }
        }

        #[test]
        fn forward_walk_shows_every_record_once((ranks, per_page, descending) in scenario()) {
            let (ordered, paginator) = build(&ranks, per_page, descending);
            let pages: Vec<_> = paginator.pages().collect::<Result<_, _>>().unwrap();

            let (last, full) = pages.split_last().unwrap();
            for page in full {
                prop_assert_eq!(page.len(), per_page);
            }
            prop_assert!(last.len() <= per_page);

            let shown: Vec<u32> = pages.iter().flat_map(row_ids).collect();
            prop_assert_eq!(shown, ordered);
        }

        #[test]
        fn previous_token_returns_to_the_previous_page((ranks, per_page, descending) in scenario()) {
            let (_, paginator) = build(&ranks, per_page, descending);
            let pages: Vec<_> = paginator.pages().collect::<Result<_, _>>().unwrap();

            prop_assert!(pages[0].previous_token().unwrap().is_none());

            for k in 1..pages.len() {
                let token = pages[k].previous_token().unwrap().unwrap();
                match paginator.page(Some(&token)) {
                    // The first page is only reachable without token
                    Err(Error::StartOfSequence) => prop_assert_eq!(k, 1),
                    Ok(previous) => {
                        prop_assert!(k >= 2);
                        prop_assert_eq!(row_ids(&previous), row_ids(&pages[k - 1]));
                    }
                    Err(err) => prop_assert!(false, "unexpected error: {}", err),
                }
            }
        }

        #[test]
        fn info_fetches_the_same_page((ranks, per_page, descending) in scenario()) {
            let (_, paginator) = build(&ranks, per_page, descending);

            for page in paginator.pages() {
                let page = page.unwrap();
                if page.has_next() {
                    let again = paginator.page(Some(&page.info())).unwrap();
                    prop_assert_eq!(row_ids(&again), row_ids(&page));
                }
            }
        }

        #[test]
        fn backward_walk_never_repeats_a_record((ranks, per_page, descending) in scenario()) {
            let (ordered, paginator) = build(&ranks, per_page, descending);
            prop_assume!(ordered.len() > per_page);

            let mut current = paginator.last_page().unwrap();
            let mut shown = row_ids(&current);

            for _ in 0..=ordered.len() {
                let token = current.previous_token().unwrap().unwrap();
                let previous = match paginator.page(Some(&token)) {
                    Ok(previous) => previous,
                    Err(Error::StartOfSequence) => break,
                    Err(err) => return Err(TestCaseError::fail(err.to_string())),
                };
                prop_assert_eq!(previous.len(), per_page);

                // Re-fetch from its own info, then step forward again
                let again = paginator.page(Some(&previous.info())).unwrap();
                prop_assert_eq!(row_ids(&again), row_ids(&previous));
                let next = paginator.page(previous.next_token().unwrap().as_ref()).unwrap();
                prop_assert_eq!(row_ids(&next), row_ids(&current));

                let mut ids = row_ids(&previous);
                ids.extend(shown);
                shown = ids;
                current = previous;
            }

            // What is left before is covered by the first page
            let gap = ordered.len() - shown.len();
            prop_assert!(gap <= per_page);
            prop_assert_eq!(&ordered[gap..], shown.as_slice());
        }
    }
}
