#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const INDEXER_RAKE: &str = "\
namespace :indexer do
  # @zen team: search
  # @zen keywords: elasticsearch, reindex
  desc 'Reindex all employees'
  task employees: :environment do
    Employee.reindex
  end

  desc 'Reindex all departments'
  task departments: :environment do
    Department.reindex
  end

  desc 'Drop and rebuild every index'
  task reset_all: :environment do
    Search.reset!
  end
end
";

pub const APPROVALS_RAKE: &str = "\
namespace :approvals do
  # @zen team: hr-platform
  # @zen safety: caution
  # @zen keywords: sync, permissions
  desc 'Sync approval permissions'
  task :sync_permissions, [:days_ago] => :environment do |_t, args|
    Approvals::PermissionSync.new(args[:days_ago]).call
  end

  desc 'Skip nonresponsive approvers'
  task skip_nonresponsive: :environment do
    Approvals.skip_nonresponsive!
  end
end
";

pub const MAINTENANCE_RAKE: &str = "\
zen_desc 'Run database backup',
  team: 'devops',
  safety: :destructive,
  keywords: %w[backup postgres]
task db_backup: :environment do
  Backup.run(label: \"nightly {full} end\")
  Backup.prune
end
";

/// A project with three rake files and six tasks, three of them annotated
pub fn fixture_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "lib/tasks/indexer.rake", INDEXER_RAKE);
    write(temp_dir.path(), "lib/tasks/approvals.rake", APPROVALS_RAKE);
    write(temp_dir.path(), "lib/tasks/maintenance.rake", MAINTENANCE_RAKE);
    temp_dir
}

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
