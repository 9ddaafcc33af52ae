//! Gather bucketed statistics about your S3 buckets.
//!
//! This utility walks every object of the selected buckets and counts
//! them by size range, age range, storage class, extension, month and
//! root folder, before writing the counts out as a CSV report.
//!
//! Listing and counting run in two separate pools of workers: bucket
//! workers list object pages and push them into a bounded channel, and
//! page workers drain the channel into a shared `Registry`. The report
//! is only rendered once every worker of both pools has been joined.
use clap::{value_t, App, Arg, ArgMatches, SubCommand};
use parking_lot::Mutex;
use rusoto_core::region::Region;
use rusoto_s3::*;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cli;
use crate::client;
use crate::types::UtilResult;
use crate::walker::PageWalker;

pub mod counter;
pub mod node;
pub mod observation;
pub mod range;
pub mod registry;
pub mod render;
pub mod util;

use self::observation::Observation;
use self::registry::Registry;
use self::render::{ReportType, Renderer};

/// Number of pages which can wait for a page worker.
const PAGE_CAPACITY: usize = 100;

/// A page of objects listed from a bucket.
struct Page {
    bucket: String,
    objects: Vec<Object>,
}

/// Shared queue of bucket/prefix pairs left to list.
type BucketQueue = Arc<Mutex<VecDeque<(String, Option<String>)>>>;

/// Generates an appropriate `SubCommand` for this module.
pub fn cmd<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("report")
        .about("Gather bucketed statistics about your S3 buckets")
        .args(&[
            Arg::with_name("report-path")
                .help("Path to the CSV report to generate")
                .long("report-path")
                .env("REPORT_PATH")
                .takes_value(true)
                .default_value("/tmp/s3.csv"),
            Arg::with_name("buckets")
                .help("Comma separated buckets (or s3://bucket/prefix) to scan, all if empty")
                .long("buckets")
                .env("BUCKETS")
                .takes_value(true),
            Arg::with_name("exclude-buckets")
                .help("Comma separated buckets to exclude from the scan")
                .long("exclude-buckets")
                .env("EXCLUDE_BUCKETS")
                .takes_value(true),
            Arg::with_name("report-type")
                .help("Sections of the report to generate")
                .long("report-type")
                .env("REPORT_TYPE")
                .takes_value(true)
                .possible_values(&ReportType::NAMES)
                .default_value("full"),
            Arg::with_name("bucket-workers")
                .help("Number of workers listing buckets")
                .long("bucket-workers")
                .env("BUCKET_WORKERS")
                .takes_value(true)
                .validator(cli::validate_count)
                .default_value("8"),
            Arg::with_name("page-workers")
                .help("Number of workers counting listed objects")
                .long("page-workers")
                .env("PAGE_WORKERS")
                .takes_value(true)
                .validator(cli::validate_count)
                .default_value("2"),
        ])
}

/// Executes this subcommand and returns a `UtilResult` to indicate success.
pub async fn exec(s3: S3Client, args: &ArgMatches<'_>) -> UtilResult<()> {
    // parse all arguments, all of these have defaults
    let report_path = args.value_of("report-path").unwrap_or("/tmp/s3.csv");
    let report_type = value_t!(args, "report-type", ReportType)?;
    let bucket_workers = value_t!(args, "bucket-workers", usize)?;
    let page_workers = value_t!(args, "page-workers", usize)?;

    // determine which buckets to walk
    let excluded = cli::get_list(args, "exclude-buckets");
    let buckets = cli::get_list(args, "buckets");
    let mut targets: Vec<(String, Option<String>)> = if buckets.is_empty() {
        client::list_buckets(&s3)
            .await?
            .into_iter()
            .map(|bucket| (bucket, None))
            .collect()
    } else {
        buckets.iter().map(|value| cli::get_bucket_pair(value)).collect()
    };
    targets.retain(|(bucket, _)| !excluded.contains(bucket));

    let start = Instant::now();
    let registry = Arc::new(Registry::new());

    // empty buckets still need a row in the report
    for (bucket, _) in &targets {
        registry.get_or_create(bucket);
    }

    info!("Scanning {} buckets...", targets.len());

    let queue: BucketQueue = Arc::new(Mutex::new(targets.into_iter().collect()));
    let (sender, receiver) = mpsc::channel(PAGE_CAPACITY);
    let receiver = Arc::new(AsyncMutex::new(receiver));

    // spawn all page workers first, to drain pages as they arrive
    let counters: Vec<JoinHandle<()>> = (0..page_workers)
        .map(|_| tokio::spawn(count_pages(Arc::clone(&receiver), Arc::clone(&registry))))
        .collect();

    let listers: Vec<JoinHandle<UtilResult<()>>> = (0..bucket_workers)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(list_pages(s3.clone(), queue, sender.clone()))
        })
        .collect();

    // workers hold the remaining senders
    drop(sender);

    // wait for all listing, keeping the first failure
    let mut result = Ok(());
    for lister in listers {
        let outcome = lister.await?;
        if result.is_ok() {
            result = outcome;
        }
    }

    // channel is closed, so counters will finish
    for counter in counters {
        counter.await?;
    }

    // listing failed, don't write a partial report
    result?;

    // write the report, buffering to avoid a write per field
    let file = File::create(report_path)?;
    let entities = registry.all();

    let renderer = Renderer::new(&entities, report_type);
    if let Err(err) = renderer.render(&mut BufWriter::new(file)) {
        error!("Report {} left incomplete at \"{}\"", report_path, err.table());
        return Err(err.into());
    }

    // task done, so check execution time
    let elapsed = Duration::from_secs(start.elapsed().as_secs());
    let (files, bytes) = entities.values().fold((0, 0), |(files, bytes), node| {
        (files + node.tally().items(), bytes + node.tally().bytes())
    });

    info!(
        "Counted {} files ({}) in {}, report written to {}",
        files,
        util::convert_bytes(bytes),
        humantime::format_duration(elapsed),
        report_path
    );

    Ok(())
}

/// Lists all buckets from the shared queue, pushing pages into the channel.
async fn list_pages(
    s3: S3Client,
    queue: BucketQueue,
    sender: mpsc::Sender<Page>,
) -> UtilResult<()> {
    let default_region = Region::default();

    loop {
        // never hold the lock across an await
        let (next, remaining) = {
            let mut queue = queue.lock();
            (queue.pop_front(), queue.len())
        };

        let (bucket, prefix) = match next {
            Some(target) => target,
            None => return Ok(()),
        };

        info!("{} buckets left in the queue", remaining);

        // locate the bucket, skip it when it cannot be found
        let region = match client::locate(&s3, &bucket).await {
            Ok(region) => region,
            Err(err) => {
                error!("Unable to locate bucket {}: {}", bucket, err);
                continue;
            }
        };

        info!("Bucket: {}, Location: {}", bucket, region.name());

        // requests must be sent to the bucket's own region
        let local = if region == default_region {
            s3.clone()
        } else {
            client::connect(region)?
        };

        let mut walker = PageWalker::new(local, bucket.clone(), prefix);

        while let Some(objects) = walker.next().await? {
            let page = Page {
                bucket: bucket.clone(),
                objects,
            };

            // receivers only go away on shutdown
            if sender.send(page).await.is_err() {
                return Ok(());
            }
        }
    }
}

/// Counts every page received into the registry, until the channel closes.
async fn count_pages(receiver: Arc<AsyncMutex<mpsc::Receiver<Page>>>, registry: Arc<Registry>) {
    loop {
        // only hold the lock for the receive itself
        let page = receiver.lock().await.recv().await;

        let page = match page {
            Some(page) => page,
            None => return,
        };

        debug!(
            "1 page of {} objects fetched for bucket {}",
            page.objects.len(),
            page.bucket
        );

        record_page(&registry, &page);
    }
}

/// Records all objects of a page against the page's bucket.
fn record_page(registry: &Registry, page: &Page) {
    for object in &page.objects {
        match Observation::from_object(object) {
            Ok(Some(observation)) => registry.record(&page.bucket, &observation),
            Ok(None) => (),
            Err(err) => warn!("Skipping object in {}: {}", page.bucket, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(key: &str, size: i64, class: &str) -> Object {
        Object {
            key: Some(key.into()),
            size: Some(size),
            last_modified: Some("2021-02-03T04:05:06.000Z".into()),
            storage_class: Some(class.into()),
            ..Object::default()
        }
    }

    #[test]
    fn recording_pages() {
        let registry = Registry::new();
        let page = Page {
            bucket: "bucket-a".into(),
            objects: vec![
                object("root/", 0, "STANDARD"),
                object("root/a.txt", 512, "STANDARD"),
                object("root/b.txt", 2048, "STANDARD"),
                object("logs/c.bin", 209715200, "GLACIER"),
                object("broken.txt", -5, "STANDARD"),
            ],
        };

        record_page(&registry, &page);

        let node = registry.get_or_create("bucket-a");
        let groups = node.groups();

        assert_eq!(node.tally().items(), 3);
        assert_eq!(node.tally().months().get("2021-02"), 3);
        assert_eq!(groups["root"].items(), 2);
        assert_eq!(groups["logs"].items(), 1);
        assert!(!groups.contains_key("broken.txt"));
    }

    #[tokio::test]
    async fn counting_pages_until_closed() {
        let registry = Arc::new(Registry::new());
        let (sender, receiver) = mpsc::channel(2);
        let receiver = Arc::new(AsyncMutex::new(receiver));

        let counters: Vec<_> = (0..3)
            .map(|_| tokio::spawn(count_pages(Arc::clone(&receiver), Arc::clone(&registry))))
            .collect();

        for idx in 0..50 {
            let page = Page {
                bucket: format!("bucket-{}", idx % 2),
                objects: vec![
                    object(&format!("root/{}.txt", idx), 10, "STANDARD"),
                    object(&format!("other/{}.txt", idx), 10, "STANDARD"),
                ],
            };
            sender.send(page).await.unwrap();
        }
        drop(sender);

        for counter in counters {
            counter.await.unwrap();
        }

        let all = registry.all();
        assert_eq!(all.len(), 2);
        assert_eq!(all["bucket-0"].tally().items(), 50);
        assert_eq!(all["bucket-1"].tally().items(), 50);
        assert_eq!(all["bucket-0"].groups()["root"].items(), 25);
    }
}
