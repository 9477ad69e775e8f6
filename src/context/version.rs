//! Target server versions, engine types and engine editions

use std::fmt;

/// SQL Server version target, ordered by release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SqlServerVersion {
    Sql80,  // SQL Server 2000
    Sql90,  // SQL Server 2005
    Sql100, // SQL Server 2008
    Sql105, // SQL Server 2008 R2
    Sql110, // SQL Server 2012
    Sql120, // SQL Server 2014
    Sql130, // SQL Server 2016
    Sql140, // SQL Server 2017
    Sql150, // SQL Server 2019
    Sql160, // SQL Server 2022
    Sql170, // SQL Server 2025
}

impl Default for SqlServerVersion {
    fn default() -> Self {
        SqlServerVersion::Sql160
    }
}

impl std::str::FromStr for SqlServerVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sql80" | "80" | "2000" => Ok(SqlServerVersion::Sql80),
            "sql90" | "90" | "2005" => Ok(SqlServerVersion::Sql90),
            "sql100" | "100" | "2008" => Ok(SqlServerVersion::Sql100),
            "sql105" | "105" | "2008r2" => Ok(SqlServerVersion::Sql105),
            "sql110" | "110" | "2012" => Ok(SqlServerVersion::Sql110),
            "sql120" | "120" | "2014" => Ok(SqlServerVersion::Sql120),
            "sql130" | "130" | "2016" => Ok(SqlServerVersion::Sql130),
            "sql140" | "140" | "2017" => Ok(SqlServerVersion::Sql140),
            "sql150" | "150" | "2019" => Ok(SqlServerVersion::Sql150),
            "sql160" | "160" | "2022" => Ok(SqlServerVersion::Sql160),
            "sql170" | "170" | "2025" => Ok(SqlServerVersion::Sql170),
            _ => Err(format!("Unknown SQL Server version: {}", s)),
        }
    }
}

impl SqlServerVersion {
    /// Compatibility ordinal (80, 90, ... 170)
    pub fn ordinal(&self) -> u16 {
        match self {
            SqlServerVersion::Sql80 => 80,
            SqlServerVersion::Sql90 => 90,
            SqlServerVersion::Sql100 => 100,
            SqlServerVersion::Sql105 => 105,
            SqlServerVersion::Sql110 => 110,
            SqlServerVersion::Sql120 => 120,
            SqlServerVersion::Sql130 => 130,
            SqlServerVersion::Sql140 => 140,
            SqlServerVersion::Sql150 => 150,
            SqlServerVersion::Sql160 => 160,
            SqlServerVersion::Sql170 => 170,
        }
    }

    /// Map a compatibility ordinal back to a version. Unknown ordinals above
    /// the newest release clamp to the newest one.
    pub fn from_ordinal(ordinal: u16) -> Option<Self> {
        let version = match ordinal {
            80 => SqlServerVersion::Sql80,
            90 => SqlServerVersion::Sql90,
            100 => SqlServerVersion::Sql100,
            105 => SqlServerVersion::Sql105,
            110 => SqlServerVersion::Sql110,
            120 => SqlServerVersion::Sql120,
            130 => SqlServerVersion::Sql130,
            140 => SqlServerVersion::Sql140,
            150 => SqlServerVersion::Sql150,
            160 => SqlServerVersion::Sql160,
            170 => SqlServerVersion::Sql170,
            n if n > 170 => SqlServerVersion::Sql170,
            _ => return None,
        };
        Some(version)
    }
}

impl fmt::Display for SqlServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sql{}", self.ordinal())
    }
}

/// Kind of engine the script is targeted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineType {
    #[default]
    Standalone,
    CloudDatabase,
    CloudDataWarehouse,
    ManagedInstance,
    ArcManagedInstance,
}

impl std::str::FromStr for EngineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standalone" => Ok(EngineType::Standalone),
            "clouddatabase" | "azuresqldatabase" => Ok(EngineType::CloudDatabase),
            "clouddatawarehouse" | "azuresqldatawarehouse" => Ok(EngineType::CloudDataWarehouse),
            "managedinstance" => Ok(EngineType::ManagedInstance),
            "arcmanagedinstance" => Ok(EngineType::ArcManagedInstance),
            _ => Err(format!("Unknown engine type: {}", s)),
        }
    }
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineType::Standalone => "Standalone",
            EngineType::CloudDatabase => "CloudDatabase",
            EngineType::CloudDataWarehouse => "CloudDataWarehouse",
            EngineType::ManagedInstance => "ManagedInstance",
            EngineType::ArcManagedInstance => "ArcManagedInstance",
        };
        f.write_str(name)
    }
}

/// Engine edition of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EngineEdition {
    #[default]
    Unknown,
    Standard,
    Enterprise,
    Express,
    Developer,
    SqlDatabase,
    SqlDataWarehouse,
    SqlStretchDatabase,
    SqlManagedInstance,
    SqlOnDemand,
}

impl std::str::FromStr for EngineEdition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" => Ok(EngineEdition::Unknown),
            "standard" => Ok(EngineEdition::Standard),
            "enterprise" => Ok(EngineEdition::Enterprise),
            "express" => Ok(EngineEdition::Express),
            "developer" => Ok(EngineEdition::Developer),
            "sqldatabase" => Ok(EngineEdition::SqlDatabase),
            "sqldatawarehouse" => Ok(EngineEdition::SqlDataWarehouse),
            "sqlstretchdatabase" => Ok(EngineEdition::SqlStretchDatabase),
            "sqlmanagedinstance" => Ok(EngineEdition::SqlManagedInstance),
            "sqlondemand" => Ok(EngineEdition::SqlOnDemand),
            _ => Err(format!("Unknown engine edition: {}", s)),
        }
    }
}
