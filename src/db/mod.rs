pub mod db;
pub mod engagementdb;
pub mod ledgerdb;
pub mod userdb;
