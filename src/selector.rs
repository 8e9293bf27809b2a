use crate::types::SenderWallet;
use rand::Rng;
use rand::seq::SliceRandom;

pub fn pick_wallet<'a, R: Rng + ?Sized>(
    wallets: &'a [SenderWallet],
    rng: &mut R,
) -> Option<&'a SenderWallet> {
    wallets.choose(rng)
}

pub fn pick_recipient<'a, R: Rng + ?Sized>(
    recipients: &'a [String],
    rng: &mut R,
) -> Option<&'a str> {
    recipients.choose(rng).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_wallets;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn empty_sets_yield_none() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(pick_wallet(&[], &mut rng).is_none());
        assert!(pick_recipient(&[], &mut rng).is_none());
    }

    #[test]
    fn every_recipient_is_reachable() {
        let mut rng = StdRng::seed_from_u64(42);
        let recipients: Vec<String> = ["0xA", "0xB", "0xC"].iter().map(|s| s.to_string()).collect();

        let seen: HashSet<&str> = (0..200)
            .filter_map(|_| pick_recipient(&recipients, &mut rng))
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn picks_from_configured_wallets() {
        let mut rng = StdRng::seed_from_u64(7);
        let wallets = test_wallets(3);
        let addresses: HashSet<_> = wallets.iter().map(SenderWallet::address).collect();

        for _ in 0..50 {
            let wallet = pick_wallet(&wallets, &mut rng).unwrap();
            assert!(addresses.contains(&wallet.address()));
        }
    }
}
