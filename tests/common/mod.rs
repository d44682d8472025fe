//! In-process stand-in for the MBTA API.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mbta_tracker::fetch::{HttpClient, RetryPolicy, Transport};
use reqwest::header::HeaderMap;
use reqwest::{Request, Response, Url};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "http://mbta.test";

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(&'static str, String)>,
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub url: Url,
    pub headers: HeaderMap,
}

/// Serves canned replies by URL path.
///
/// Queued replies are used once each, in order; after that the path's
/// standing reply (if any) repeats. Unknown paths get a 404.
#[derive(Default)]
pub struct FakeApi {
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    standing: Mutex<HashMap<String, Reply>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<Recorded>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, path: &str, reply: Reply) {
        self.standing.lock().unwrap().insert(path.to_string(), reply);
    }

    pub fn queue(&self, path: &str, reply: Reply) {
        self.queued
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn delay(&self, path: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(path.to_string(), delay);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.path() == path)
            .count()
    }

    fn reply_for(&self, path: &str) -> Reply {
        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front)
        {
            return reply;
        }
        self.standing
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Reply::status(404, r#"{"errors":[]}"#))
    }
}

#[async_trait]
impl HttpClient for FakeApi {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        let path = req.url().path().to_string();
        self.requests.lock().unwrap().push(Recorded {
            url: req.url().clone(),
            headers: req.headers().clone(),
        });

        let delay = self.delays.lock().unwrap().get(&path).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.reply_for(&path);
        let mut builder = http::Response::builder().status(reply.status);
        for (name, value) in &reply.headers {
            builder = builder.header(*name, value.as_str());
        }
        let response = builder.body(reply.body).unwrap();
        Ok(Response::from(response))
    }
}

pub fn transport(api: &Arc<FakeApi>) -> Arc<Transport> {
    Arc::new(Transport::new(api.clone(), BASE_URL).with_retry_policy(RetryPolicy::immediate()))
}

pub fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Fixed "now" used by prediction fixtures: 2025-10-18 14:00:00 UTC.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 18, 14, 0, 0).unwrap()
}

pub const PARK_STREET_STOPS: &str = r#"{"data":[
    {"id":"place-pktrm","type":"stop","attributes":{"name":"Park Street","parent_station":null}},
    {"id":"70075","type":"stop","attributes":{"name":"Park Street","parent_station":"place-pktrm"}},
    {"id":"place-dwnxg","type":"stop","attributes":{"name":"Downtown Crossing","parent_station":null}}
]}"#;

pub const RED_DIRECTIONS: &str =
    r#"{"data":{"id":"Red","type":"route","attributes":{"direction_names":["South","North"]}}}"#;
