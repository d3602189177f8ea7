use std::collections::HashSet;

/// Answers whether an asset is a stablecoin, which gates isolation-mode
/// borrowing.
pub trait AssetClassifier {
    fn is_stable_asset(&self, symbol: &str) -> bool;
}

impl<F> AssetClassifier for F
where
    F: Fn(&str) -> bool,
{
    fn is_stable_asset(&self, symbol: &str) -> bool {
        self(symbol)
    }
}

/// Fixed list of stable asset symbols, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StableAssetList {
    symbols: HashSet<String>,
}

impl StableAssetList {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            symbols: symbols
                .into_iter()
                .map(|s| s.as_ref().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl AssetClassifier for StableAssetList {
    fn is_stable_asset(&self, symbol: &str) -> bool {
        self.symbols.contains(&symbol.to_ascii_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_match() {
        let list = StableAssetList::new(["USDC", "dai"]);
        assert!(list.is_stable_asset("usdc"));
        assert!(list.is_stable_asset("DAI"));
        assert!(!list.is_stable_asset("WETH"));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_closure_classifier() {
        let classifier = |symbol: &str| symbol.starts_with("USD");
        assert!(classifier.is_stable_asset("USDT"));
        assert!(!classifier.is_stable_asset("WBTC"));
    }
}
