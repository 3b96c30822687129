mod blocking;
mod commands;
mod test_utils;
