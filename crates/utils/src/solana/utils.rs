use super::constants::LAMPORTS_PER_SOL;

/// 代币工具类
pub struct TokenUtils;

impl TokenUtils {
    /// lamports -> SOL，仅用于日志展示
    pub fn lamports_to_sol(lamports: u64) -> f64 {
        lamports as f64 / LAMPORTS_PER_SOL as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lamports_to_sol() {
        assert_eq!(TokenUtils::lamports_to_sol(80_000_000), 0.08);
        assert_eq!(TokenUtils::lamports_to_sol(0), 0.0);
    }
}
