pub mod tests_placement;
