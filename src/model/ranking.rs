use chrono::NaiveDate;

/// How the rows of one period are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionPolicy {
    /// Keep each entity's chronologically last row
    Last,
    /// Average each entity's score and re-rank
    Mean,
    /// No grouping; every file is its own period
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RankingType {
    Bgg,
    RecommendGames,
    Factor,
    Similarity,
    Charts,
}

impl RankingType {
    pub fn all() -> [RankingType; 5] {
        [
            RankingType::Bgg,
            RankingType::RecommendGames,
            RankingType::Factor,
            RankingType::Similarity,
            RankingType::Charts,
        ]
    }

    /// Code stored in the `ranking_type` column
    pub fn code(&self) -> &'static str {
        match self {
            RankingType::Bgg => "bgg",
            RankingType::RecommendGames => "r_g",
            RankingType::Factor => "fac",
            RankingType::Similarity => "sim",
            RankingType::Charts => "cha",
        }
    }

    /// Directory holding this type's snapshot files
    pub fn sub_dir(&self) -> &'static str {
        match self {
            RankingType::Bgg => "bgg",
            RankingType::RecommendGames => "r_g",
            RankingType::Factor => "factor",
            RankingType::Similarity => "similarity",
            RankingType::Charts => "charts",
        }
    }

    pub fn policy(&self) -> ReductionPolicy {
        match self {
            RankingType::Bgg => ReductionPolicy::Last,
            RankingType::Charts => ReductionPolicy::All,
            _ => ReductionPolicy::Mean,
        }
    }

    /// Snapshots before this date are ignored
    pub fn min_date(&self) -> Option<NaiveDate> {
        match self {
            RankingType::Charts => NaiveDate::from_ymd_opt(2016, 1, 1),
            _ => None,
        }
    }

    /// Accepts either the stored code or the directory name
    pub fn from_str(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|t| t.code() == value || t.sub_dir() == value)
    }
}

impl std::fmt::Display for RankingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One persisted ranking row, unique per `(game_id, ranking_type, date)`
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRecord {
    pub game_id: i64,
    pub ranking_type: RankingType,
    pub rank: u32,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_type_lookup() {
        assert_eq!(RankingType::from_str("factor"), Some(RankingType::Factor));
        assert_eq!(RankingType::from_str("FAC"), Some(RankingType::Factor));
        assert_eq!(RankingType::from_str("r_g"), Some(RankingType::RecommendGames));
        assert_eq!(RankingType::from_str("nope"), None);
    }

    #[test]
    fn test_policies() {
        assert_eq!(RankingType::Bgg.policy(), ReductionPolicy::Last);
        assert_eq!(RankingType::Similarity.policy(), ReductionPolicy::Mean);
        assert_eq!(RankingType::Charts.policy(), ReductionPolicy::All);
        assert_eq!(
            RankingType::Charts.min_date(),
            NaiveDate::from_ymd_opt(2016, 1, 1)
        );
        assert_eq!(RankingType::Bgg.min_date(), None);
    }
}
