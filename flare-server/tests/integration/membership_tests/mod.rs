mod test_join_reports_members;
