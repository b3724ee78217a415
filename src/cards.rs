//! Saved payment cards.
//!
//! Cards are display metadata only: the full number is checked and then
//! dropped, keeping the brand and the last four digits. A user's wallet is
//! kept in the session storage next to the session itself.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::SessionContext;
use crate::error::{Error, Result};

/// Card network, detected from the number prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Unknown,
}

impl CardBrand {
    pub fn detect(digits: &str) -> Self {
        let prefix = |n: usize| digits.get(..n).and_then(|p| p.parse::<u32>().ok());

        if digits.starts_with('4') {
            CardBrand::Visa
        } else if matches!(prefix(2), Some(51..=55)) || matches!(prefix(4), Some(2221..=2720)) {
            CardBrand::Mastercard
        } else if matches!(prefix(2), Some(34 | 37)) {
            CardBrand::Amex
        } else if prefix(4) == Some(6011) || prefix(2) == Some(65) || matches!(prefix(3), Some(644..=649)) {
            CardBrand::Discover
        } else {
            CardBrand::Unknown
        }
    }
}

/// Luhn checksum over a string of ASCII digits
fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (i, c) in digits.chars().rev().enumerate() {
        let Some(mut d) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

/// A card as kept in the wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCard {
    pub id: String,
    pub holder_name: String,
    pub brand: CardBrand,
    pub last4: String,
    pub exp_month: u32,
    pub exp_year: i32,
    #[serde(default)]
    pub is_default: bool,
}

impl SavedCard {
    /// e.g. `Visa •••• 4242`
    pub fn label(&self) -> String {
        let brand = match self.brand {
            CardBrand::Visa => "Visa",
            CardBrand::Mastercard => "Mastercard",
            CardBrand::Amex => "American Express",
            CardBrand::Discover => "Discover",
            CardBrand::Unknown => "Card",
        };
        format!("{} •••• {}", brand, self.last4)
    }
}

/// Card details as typed in by the shopper
#[derive(Debug, Clone)]
pub struct NewCard {
    pub holder_name: String,
    pub number: String,
    pub exp_month: u32,
    pub exp_year: i32,
    pub make_default: bool,
}

impl NewCard {
    /// Check the details and reduce them to a [`SavedCard`]
    pub fn validate(&self, today: NaiveDate) -> Result<SavedCard> {
        let holder_name = self.holder_name.trim();
        if holder_name.is_empty() {
            return Err(Error::validation("Cardholder name is required"));
        }

        let digits: String = self
            .number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();
        if !(13..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::validation("Card number must be 13 to 19 digits"));
        }
        if !luhn_valid(&digits) {
            return Err(Error::validation("Card number is invalid"));
        }

        if !(1..=12).contains(&self.exp_month) {
            return Err(Error::validation("Expiry month must be between 1 and 12"));
        }
        if (self.exp_year, self.exp_month) < (today.year(), today.month()) {
            return Err(Error::validation("Card has expired"));
        }

        Ok(SavedCard {
            id: Uuid::new_v4().to_string(),
            holder_name: holder_name.to_string(),
            brand: CardBrand::detect(&digits),
            last4: digits[digits.len() - 4..].to_string(),
            exp_month: self.exp_month,
            exp_year: self.exp_year,
            is_default: self.make_default,
        })
    }
}

/// A user's saved cards; at most one is the default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardWallet {
    cards: Vec<SavedCard>,
}

impl CardWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a wallet from stored cards, keeping only the first default flag
    pub fn from_cards(cards: Vec<SavedCard>) -> Self {
        let mut wallet = Self { cards };
        let mut seen_default = false;
        for card in &mut wallet.cards {
            if card.is_default {
                card.is_default = !seen_default;
                seen_default = true;
            }
        }
        wallet
    }

    pub fn cards(&self) -> &[SavedCard] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn default_card(&self) -> Option<&SavedCard> {
        self.cards.iter().find(|c| c.is_default)
    }

    pub fn get(&self, id: &str) -> Option<&SavedCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Add a card. The first card becomes the default; a card flagged default
    /// takes the flag from the others.
    pub fn add(&mut self, mut card: SavedCard) -> Result<&SavedCard> {
        let duplicate = self.cards.iter().any(|c| {
            c.brand == card.brand
                && c.last4 == card.last4
                && c.exp_month == card.exp_month
                && c.exp_year == card.exp_year
        });
        if duplicate {
            return Err(Error::Conflict("This card is already saved".to_string()));
        }

        if self.cards.is_empty() {
            card.is_default = true;
        }
        if card.is_default {
            self.cards.iter_mut().for_each(|c| c.is_default = false);
        }
        self.cards.push(card);
        Ok(&self.cards[self.cards.len() - 1])
    }

    /// Make `id` the default card
    pub fn set_default(&mut self, id: &str) -> Result<()> {
        if self.get(id).is_none() {
            return Err(Error::not_found(format!("Card {} not found", id)));
        }
        for card in &mut self.cards {
            card.is_default = card.id == id;
        }
        Ok(())
    }

    /// Remove `id`. Removing the default hands the flag to the first remaining
    /// card.
    pub fn remove(&mut self, id: &str) -> Result<SavedCard> {
        let index = self
            .cards
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::not_found(format!("Card {} not found", id)))?;

        let removed = self.cards.remove(index);
        if removed.is_default {
            if let Some(first) = self.cards.first_mut() {
                first.is_default = true;
            }
        }
        Ok(removed)
    }
}

/// Loads and saves the signed-in user's wallet
pub struct CardsClient {
    session: SessionContext,
}

impl CardsClient {
    pub(crate) fn new(session: SessionContext) -> Self {
        Self { session }
    }

    fn storage_key(user_id: &str) -> String {
        format!("savedCards:{}", user_id)
    }

    pub async fn load(&self) -> Result<CardWallet> {
        let credentials = self.session.require().await?;
        let key = Self::storage_key(&credentials.user_id);
        match self.session.storage().get_item(&key).await? {
            Some(blob) => Ok(CardWallet::from_cards(serde_json::from_str(&blob)?)),
            None => Ok(CardWallet::new()),
        }
    }

    pub async fn save(&self, wallet: &CardWallet) -> Result<()> {
        let credentials = self.session.require().await?;
        let key = Self::storage_key(&credentials.user_id);
        let blob = serde_json::to_string(wallet)?;
        self.session.storage().set_item(&key, &blob).await?;
        debug!(user_id = %credentials.user_id, cards = wallet.len(), "saved cards stored");
        Ok(())
    }

    /// Validate and store a new card
    pub async fn add(&self, card: NewCard) -> Result<SavedCard> {
        let saved = card.validate(Utc::now().date_naive())?;
        let mut wallet = self.load().await?;
        let added = wallet.add(saved)?.clone();
        self.save(&wallet).await?;
        Ok(added)
    }

    pub async fn set_default(&self, id: &str) -> Result<CardWallet> {
        let mut wallet = self.load().await?;
        wallet.set_default(id)?;
        self.save(&wallet).await?;
        Ok(wallet)
    }

    pub async fn remove(&self, id: &str) -> Result<CardWallet> {
        let mut wallet = self.load().await?;
        wallet.remove(id)?;
        self.save(&wallet).await?;
        Ok(wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn new_card(number: &str, make_default: bool) -> NewCard {
        NewCard {
            holder_name: "Ada Lovelace".into(),
            number: number.into(),
            exp_month: 12,
            exp_year: 2030,
            make_default,
        }
    }

    fn wallet_with(numbers: &[&str]) -> CardWallet {
        let mut wallet = CardWallet::new();
        for number in numbers {
            wallet.add(new_card(number, false).validate(today()).unwrap()).unwrap();
        }
        wallet
    }

    fn default_count(wallet: &CardWallet) -> usize {
        wallet.cards().iter().filter(|c| c.is_default).count()
    }

    const VISA: &str = "4242 4242 4242 4242";
    const MASTERCARD: &str = "5555-5555-5555-4444";
    const AMEX: &str = "378282246310005";

    #[test]
    fn validation_keeps_only_last_four() {
        let card = new_card(VISA, false).validate(today()).unwrap();
        assert_eq!(card.brand, CardBrand::Visa);
        assert_eq!(card.last4, "4242");
        assert_eq!(card.label(), "Visa •••• 4242");
    }

    #[test]
    fn brand_detection() {
        assert_eq!(CardBrand::detect("5555555555554444"), CardBrand::Mastercard);
        assert_eq!(CardBrand::detect("2223003122003222"), CardBrand::Mastercard);
        assert_eq!(CardBrand::detect("378282246310005"), CardBrand::Amex);
        assert_eq!(CardBrand::detect("6011111111111117"), CardBrand::Discover);
        assert_eq!(CardBrand::detect("9999999999999995"), CardBrand::Unknown);
    }

    #[test]
    fn rejects_bad_cards() {
        assert!(new_card("4242 4242 4242 4241", false).validate(today()).is_err());
        assert!(new_card("4242", false).validate(today()).is_err());
        assert!(new_card("4242abcd42424242", false).validate(today()).is_err());

        let mut expired = new_card(VISA, false);
        expired.exp_year = 2026;
        expired.exp_month = 5;
        assert!(expired.validate(today()).is_err());
        expired.exp_month = 6;
        assert!(expired.validate(today()).is_ok());

        let mut nameless = new_card(VISA, false);
        nameless.holder_name = "  ".into();
        assert!(nameless.validate(today()).is_err());
    }

    #[test]
    fn first_card_becomes_default() {
        let wallet = wallet_with(&[VISA, MASTERCARD]);
        assert_eq!(wallet.default_card().unwrap().last4, "4242");
        assert_eq!(default_count(&wallet), 1);
    }

    #[test]
    fn adding_a_default_card_moves_the_flag() {
        let mut wallet = wallet_with(&[VISA]);
        wallet.add(new_card(AMEX, true).validate(today()).unwrap()).unwrap();
        assert_eq!(wallet.default_card().unwrap().brand, CardBrand::Amex);
        assert_eq!(default_count(&wallet), 1);
    }

    #[test]
    fn duplicate_cards_are_rejected() {
        let mut wallet = wallet_with(&[VISA]);
        let again = new_card(VISA, false).validate(today()).unwrap();
        assert!(matches!(wallet.add(again), Err(Error::Conflict(_))));
    }

    #[test]
    fn removing_default_promotes_another() {
        let mut wallet = wallet_with(&[VISA, MASTERCARD, AMEX]);
        let default_id = wallet.default_card().unwrap().id.clone();
        wallet.remove(&default_id).unwrap();
        assert_eq!(wallet.len(), 2);
        assert_eq!(default_count(&wallet), 1);
        assert_eq!(wallet.default_card().unwrap().last4, "4444");
    }

    #[test]
    fn removing_non_default_keeps_default() {
        let mut wallet = wallet_with(&[VISA, MASTERCARD]);
        let other = wallet.cards()[1].id.clone();
        wallet.remove(&other).unwrap();
        assert_eq!(wallet.default_card().unwrap().last4, "4242");
    }

    #[test]
    fn removing_last_card_leaves_no_default() {
        let mut wallet = wallet_with(&[VISA]);
        let id = wallet.cards()[0].id.clone();
        wallet.remove(&id).unwrap();
        assert!(wallet.is_empty());
        assert!(wallet.default_card().is_none());
        assert!(matches!(wallet.remove(&id), Err(Error::NotFound(_))));
    }

    #[test]
    fn set_default_is_exclusive() {
        let mut wallet = wallet_with(&[VISA, MASTERCARD, AMEX]);
        let amex = wallet.cards()[2].id.clone();
        wallet.set_default(&amex).unwrap();
        assert_eq!(default_count(&wallet), 1);
        assert_eq!(wallet.default_card().unwrap().id, amex);
        assert!(wallet.set_default("missing").is_err());
    }

    #[test]
    fn stored_wallet_is_normalized() {
        let mut a = new_card(VISA, true).validate(today()).unwrap();
        let mut b = new_card(MASTERCARD, true).validate(today()).unwrap();
        a.is_default = true;
        b.is_default = true;
        let wallet = CardWallet::from_cards(vec![a, b]);
        assert_eq!(default_count(&wallet), 1);
        assert_eq!(wallet.default_card().unwrap().last4, "4242");
    }
}
