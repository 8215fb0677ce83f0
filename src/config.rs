use num_cpus;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;
use std::time::Duration;

use crate::param::{
    InstitutionVariant, ATTENDANCE_PATH, COLLEGE_BASE_URL, LOGIN_PATH, MAX_REQUEST_TIMEOUT_SECS,
    UNIVERSITY_BASE_URL,
};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    port: u16,
    worker_threads: usize,
    local: bool,
    #[serde(default = "default_cache_ttl_hours")]
    cache_ttl_hours: u64,
    #[serde(default = "default_cache_capacity")]
    cache_capacity: usize,
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default = "default_college_base_url")]
    college_base_url: String,
    #[serde(default = "default_university_base_url")]
    university_base_url: String,
}

fn default_cache_ttl_hours() -> u64 {
    6
}

fn default_cache_capacity() -> usize {
    1024
}

fn default_request_timeout_secs() -> u64 {
    MAX_REQUEST_TIMEOUT_SECS
}

fn default_college_base_url() -> String {
    COLLEGE_BASE_URL.to_string()
}

fn default_university_base_url() -> String {
    UNIVERSITY_BASE_URL.to_string()
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: 8000,
            worker_threads: 0,
            local: true,
            cache_ttl_hours: default_cache_ttl_hours(),
            cache_capacity: default_cache_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
            college_base_url: default_college_base_url(),
            university_base_url: default_university_base_url(),
        }
    }

    pub fn from_toml(filename: &str) -> Self {
        let mut str_val = String::new();
        let read = File::open(filename).and_then(|mut file| file.read_to_string(&mut str_val));
        if let Err(e) = read {
            error!("无法读取配置文件{}：{}，使用默认配置", filename, e);
            return Config::new().normalized();
        }
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(content: &str) -> Self {
        let raw_config = match toml::from_str::<Config>(content) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        raw_config.normalized()
    }

    fn normalized(mut self) -> Self {
        if self.worker_threads == 0 {
            self.worker_threads = num_cpus::get();
        }
        if self.cache_capacity == 0 {
            warn!("cache_capacity被设置为0，但目前尚不支持禁用缓存，因此该值将被改为1024。");
            self.cache_capacity = default_cache_capacity();
        }
        if self.cache_ttl_hours == 0 {
            warn!("cache_ttl_hours被设置为0，该值将被改为6。");
            self.cache_ttl_hours = default_cache_ttl_hours();
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            warn!(
                "request_timeout_secs={}超出允许范围，该值将被改为{}。",
                self.request_timeout_secs, MAX_REQUEST_TIMEOUT_SECS
            );
            self.request_timeout_secs = MAX_REQUEST_TIMEOUT_SECS;
        }
        self.college_base_url = self.college_base_url.trim_end_matches('/').to_string();
        self.university_base_url = self.university_base_url.trim_end_matches('/').to_string();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new().normalized()
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours * 60 * 60)
    }

    pub fn cache_ttl_hours(&self) -> u64 {
        self.cache_ttl_hours
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 根据院校部署返回 (登录页地址, 考勤页地址)
    pub fn endpoints(&self, variant: InstitutionVariant) -> (String, String) {
        let base = match variant {
            InstitutionVariant::College => &self.college_base_url,
            InstitutionVariant::University => &self.university_base_url,
        };
        (
            format!("{}{}", base, LOGIN_PATH),
            format!("{}{}", base, ATTENDANCE_PATH),
        )
    }

    pub fn with_base_urls(mut self, college: &str, university: &str) -> Self {
        self.college_base_url = college.trim_end_matches('/').to_string();
        self.university_base_url = university.trim_end_matches('/').to_string();
        self
    }
}
