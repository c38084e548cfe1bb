//! Column names of the reconciled rental table.

pub const DATE: &str = "date";
pub const SEASON: &str = "season";
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";
pub const HOUR: &str = "hour";
pub const WORKINGDAY: &str = "workingday";

pub const CNT_DAY: &str = "cnt_day";
pub const CNT_HOUR: &str = "cnt_hour";
pub const CASUAL_DAY: &str = "casual_day";
pub const CASUAL_HOUR: &str = "casual_hour";
pub const REGISTERED_DAY: &str = "registered_day";
pub const REGISTERED_HOUR: &str = "registered_hour";
pub const WEEKDAY_DAY: &str = "weekday_day";
pub const WEEKDAY_HOUR: &str = "weekday_hour";
pub const WEATHERSIT_DAY: &str = "weathersit_day";
pub const TEMP_DAY: &str = "temp_day";
pub const TEMP_HOUR: &str = "temp_hour";
pub const HUM_DAY: &str = "hum_day";
pub const HUM_HOUR: &str = "hum_hour";
pub const WINDSPEED_DAY: &str = "windspeed_day";
pub const WINDSPEED_HOUR: &str = "windspeed_hour";

// derived
pub const TOTAL_RENTALS: &str = "total_rentals";
pub const TOTAL_CASUAL: &str = "total_casual";
pub const TOTAL_REGISTERED: &str = "total_registered";
pub const TOTAL_WEEKDAY: &str = "total_weekday";
pub const WINDSPEED: &str = "windspeed";
pub const HUM: &str = "hum";
pub const TEMP: &str = "temp";
