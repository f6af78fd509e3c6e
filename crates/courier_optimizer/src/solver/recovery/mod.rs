pub mod failure_recovery;
