use crate::application::ports::coin_repository::CoinRepository;
use crate::application::use_cases::coins::CoinsError;
use crate::domain::coins::coin::normalize_coin_name;

pub struct DeleteCoin<'a, R: CoinRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: CoinRepository + ?Sized> DeleteCoin<'a, R> {
    /// Returns the canonical name of the removed coin.
    pub async fn execute(&self, name: &str) -> Result<String, CoinsError> {
        let name = normalize_coin_name(name).ok_or(CoinsError::NotFound)?;
        if self.repo.delete_by_name(&name).await? {
            Ok(name)
        } else {
            Err(CoinsError::NotFound)
        }
    }
}
