mod executor_test;
mod retry_test;
mod teardown_test;
