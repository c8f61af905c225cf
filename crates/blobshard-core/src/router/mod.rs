use crate::types::RoutingHash;

/// Ordered set of storage accounts that blob keys are sharded across.
///
/// An empty pool routes everything to the storage client's default account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPool {
    accounts: Vec<String>,
    hash: RoutingHash,
}

impl AccountPool {
    pub fn new(accounts: Vec<String>, hash: RoutingHash) -> Self {
        Self { accounts, hash }
    }

    /// Parse a comma-separated account list. Entries are trimmed and blanks dropped.
    pub fn parse(list: Option<&str>, hash: RoutingHash) -> Self {
        let accounts = list
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        Self { accounts, hash }
    }

    /// Index of the account that owns `key`, or `None` for an empty pool.
    pub fn index_for(&self, key: &str) -> Option<usize> {
        if self.accounts.is_empty() {
            return None;
        }
        let idx = match self.hash {
            RoutingHash::CharSum => {
                let n = self.accounts.len() as i64;
                (i64::from(char_sum(key)) % n).unsigned_abs() as usize
            }
            RoutingHash::Fnv1a => (fnv1a(key) % self.accounts.len() as u64) as usize,
        };
        Some(idx)
    }

    /// Account that owns `key`; `None` means the default account.
    pub fn resolve(&self, key: &str) -> Option<&str> {
        self.index_for(key).map(|i| self.accounts[i].as_str())
    }

    /// Accounts a container-wide operation fans out to, in pool order.
    /// An empty pool yields the default account once.
    pub fn fan_out(&self) -> Vec<Option<&str>> {
        if self.accounts.is_empty() {
            vec![None]
        } else {
            self.accounts.iter().map(|a| Some(a.as_str())).collect()
        }
    }

    /// All accounts.
    pub fn accounts(&self) -> &[String] {
        &self.accounts
    }

    pub fn hash(&self) -> RoutingHash {
        self.hash
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }
}

/// Wrapping sum of UTF-16 code units. Anagrams collide; kept for placement
/// compatibility.
pub fn char_sum(key: &str) -> i32 {
    key.encode_utf16()
        .fold(0i32, |acc, unit| acc.wrapping_add(i32::from(unit)))
}

pub fn fnv1a(key: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    key.bytes()
        .fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(names: &[&str], hash: RoutingHash) -> AccountPool {
        AccountPool::new(names.iter().map(|s| s.to_string()).collect(), hash)
    }

    #[test]
    fn empty_pool_resolves_to_default() {
        let p = AccountPool::parse(None, RoutingHash::CharSum);
        assert!(p.is_empty());
        assert_eq!(p.resolve("indices/0/data"), None);
        assert_eq!(p.fan_out(), vec![None]);
    }

    #[test]
    fn parse_trims_and_drops_blanks() {
        let p = AccountPool::parse(Some(" a, b,,c ,"), RoutingHash::CharSum);
        assert_eq!(p.accounts(), &["a", "b", "c"]);
        assert_eq!(p.fan_out(), vec![Some("a"), Some("b"), Some("c")]);

        let blank = AccountPool::parse(Some(""), RoutingHash::CharSum);
        assert!(blank.is_empty());
    }

    #[test]
    fn char_sum_routing() {
        // 'a' + 'b' = 195
        assert_eq!(char_sum("ab"), 195);
        assert_eq!(char_sum(""), 0);

        let p = pool(&["acct-0", "acct-1"], RoutingHash::CharSum);
        assert_eq!(p.resolve("ab"), Some("acct-1"));
        assert_eq!(p.resolve(""), Some("acct-0"));

        let p3 = pool(&["x", "y", "z"], RoutingHash::CharSum);
        assert_eq!(p3.index_for("ab"), Some(0));
    }

    #[test]
    fn anagrams_collide_under_char_sum() {
        let p = pool(&["a", "b", "c", "d", "e"], RoutingHash::CharSum);
        assert_eq!(p.resolve("snap-123"), p.resolve("snap-321"));
    }

    #[test]
    fn overflowing_sum_stays_in_range() {
        let key = "\u{FFFF}".repeat(40_000);
        assert!(char_sum(&key) < 0);
        let p = pool(&["x", "y", "z"], RoutingHash::CharSum);
        assert_eq!(p.index_for(&key), Some(1));
    }

    #[test]
    fn routing_is_deterministic_and_in_range() {
        for hash in [RoutingHash::CharSum, RoutingHash::Fnv1a] {
            for n in 1..=7 {
                let names: Vec<String> = (0..n).map(|i| format!("acct-{i}")).collect();
                let p = AccountPool::new(names, hash);
                for i in 0..200 {
                    let key = format!("indices/{i}/__{}", i * 31);
                    let first = p.index_for(&key).unwrap();
                    assert!(first < n);
                    assert_eq!(p.index_for(&key), Some(first));
                }
            }
        }
    }

    #[test]
    fn fnv1a_known_vectors() {
        assert_eq!(fnv1a(""), 0xcbf29ce484222325);
        assert_eq!(fnv1a("a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn fnv1a_spreads_anagrams() {
        assert_ne!(fnv1a("snap-123"), fnv1a("snap-321"));
    }
}
