//! Counter helpers, one submodule per stage.
//!
//! Nothing here installs a recorder; without one the `metrics` macros are
//! no-ops.

pub mod extraction {
    pub fn card_extracted() {
        ::metrics::counter!("rift_extraction_cards_extracted_total").increment(1);
    }

    pub fn card_skipped(reason: &'static str) {
        ::metrics::counter!("rift_extraction_cards_skipped_total", "reason" => reason).increment(1);
    }

    pub fn ids_found(count: usize) {
        ::metrics::counter!("rift_extraction_event_ids_total").increment(count as u64);
    }
}

pub mod api {
    pub fn request_success() {
        ::metrics::counter!("rift_api_requests_success_total").increment(1);
    }

    pub fn request_error(kind: &'static str) {
        ::metrics::counter!("rift_api_requests_error_total", "kind" => kind).increment(1);
    }

    pub fn page_fetched() {
        ::metrics::counter!("rift_api_pages_fetched_total").increment(1);
    }

    pub fn record_skipped() {
        ::metrics::counter!("rift_api_records_skipped_total").increment(1);
    }
}

pub mod geocoding {
    pub fn lookup(provider: &'static str) {
        ::metrics::counter!("rift_geocoding_lookups_total", "provider" => provider).increment(1);
    }

    pub fn miss() {
        ::metrics::counter!("rift_geocoding_misses_total").increment(1);
    }
}

pub mod matching {
    pub fn matched() {
        ::metrics::counter!("rift_matching_matched_total").increment(1);
    }

    pub fn unmatched() {
        ::metrics::counter!("rift_matching_unmatched_total").increment(1);
    }
}

pub mod sync {
    pub fn events_enriched(count: usize) {
        ::metrics::counter!("rift_sync_events_enriched_total").increment(count as u64);
    }

    pub fn events_dropped_past(count: usize) {
        ::metrics::counter!("rift_sync_events_past_total").increment(count as u64);
    }
}

pub mod merge {
    pub fn registered_upgraded() {
        ::metrics::counter!("rift_merge_registered_upgraded_total").increment(1);
    }
}
