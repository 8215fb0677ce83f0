// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 考勤查询服务
//!
//! 基于 Tokio 运行时的多线程 HTTP 服务，对外提供门户考勤的查询接口。
//! 核心功能包括：
//! - 按学号缓存查询结果（可配置有效期与容量）
//! - 每个连接一个异步任务
//! - 后台管理控制台（CLI 指令交互）

use portal_attendance::{
    cache::ResultCache,
    config::Config,
    net::ReqwestConnector,
    portal::PortalClient,
    request::{content_length, header_end, Request},
    exception::Exception,
    router,
    service::AttendanceService,
    util::{Clock, SystemClock},
};

use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    runtime::Builder,
    sync::Notify,
};

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    process,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Instant,
};

/// 单个请求（报文头 + 请求体）允许的最大字节数
const MAX_REQUEST_BYTES: usize = 64 * 1024;

fn main() {
    // 1. 初始化日志系统
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
        process::exit(1);
    }

    // 2. 加载配置
    let config = Arc::new(Config::from_toml("config/development.toml"));
    info!("配置文件已载入");

    // 3. 按配置的工作线程数构建运行时
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建异步运行时：{}", e);
            process::exit(1);
        }
    };
    info!("工作线程数：{}", config.worker_threads());

    runtime.block_on(serve(config));
}

async fn serve(config: Arc<Config>) {
    // 4. 共享资源初始化，缓存在整个进程内只有一份
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(ResultCache::with_clock(
        config.cache_capacity(),
        config.cache_ttl(),
        Arc::clone(&clock),
    ));
    info!(
        "结果缓存：有效期{}小时，每类容量{}",
        config.cache_ttl_hours(),
        config.cache_capacity()
    );
    let connector = Arc::new(ReqwestConnector::new(config.request_timeout()));
    let portal = PortalClient::new(connector, Arc::clone(&config));
    let service = Arc::new(AttendanceService::new(Arc::clone(&cache), portal, clock));

    // 5. 网络层初始化
    let port: u16 = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    info!("服务端将在{}:{}上监听Socket连接", address, port);
    let socket = SocketAddrV4::new(address, port);

    let listener = match TcpListener::bind(socket).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            process::exit(1);
        }
    };
    info!("端口{}绑定完成", port);

    // 6. 生命周期管理
    let shutdown = Arc::new(Notify::new());
    let active_connection = Arc::new(AtomicUsize::new(0));

    // 7. 管理控制台
    tokio::spawn(console(
        Arc::clone(&shutdown),
        Arc::clone(&active_connection),
        Arc::clone(&service),
    ));

    let mut id: u128 = 0;

    // 8. 主事件循环
    loop {
        let accepted = tokio::select! {
            _ = shutdown.notified() => {
                info!("主循环接收到停机指令，正在退出...");
                break;
            }
            accepted = listener.accept() => accepted,
        };
        let (mut stream, addr) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                warn!("接受连接失败：{}", e);
                continue;
            }
        };
        debug!("[ID{}]TCP连接已建立：{}", id, addr);

        let active_connection = Arc::clone(&active_connection);
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            active_connection.fetch_add(1, Ordering::SeqCst);
            handle_connection(&mut stream, id, &service).await;
            active_connection.fetch_sub(1, Ordering::SeqCst);
        });
        id += 1;
    }
}

async fn console(
    shutdown: Arc<Notify>,
    active_connection: Arc<AtomicUsize>,
    service: Arc<AttendanceService>,
) {
    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut input = String::new();
    loop {
        input.clear();
        match reader.read_line(&mut input).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        match input.trim() {
            "stop" => {
                shutdown.notify_one();
                println!("停机指令已激活，服务器即将关闭...");
                break;
            }
            "help" => {
                println!("== Attendance Help ==");
                println!("stop   - 发出停机信号");
                println!("status - 查看当前服务器运行状态");
                println!("clear  - 清空全部结果缓存");
                println!("help   - 显示此帮助信息");
                println!("=====================");
            }
            "status" => {
                let health = service.health();
                println!("== Attendance 状态 ==");
                println!("当前活跃连接数: {}", active_connection.load(Ordering::SeqCst));
                println!(
                    "缓存条目: attendance={}, datewise={}, tilldate={}",
                    health.cache_info.attendance_cache_entries,
                    health.cache_info.datewise_cache_entries,
                    health.cache_info.tilldate_cache_entries
                );
                println!("缓存有效期: {}小时", health.cache_info.cache_duration_hours);
                println!("=====================");
            }
            "clear" => {
                let result = service.clear_cache();
                println!(
                    "已清空缓存: attendance={}, datewise={}, tilldate={}",
                    result.cleared_entries.attendance,
                    result.cleared_entries.datewise,
                    result.cleared_entries.tilldate
                );
            }
            "" => {}
            cmd => println!("无效的命令：{}", cmd),
        }
    }
}

/// 读取一个完整请求：报文头，以及 `Content-Length` 指定长度的请求体
async fn read_request(stream: &mut TcpStream, id: u128) -> Option<Vec<u8>> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let expected = header_end(&buffer).map(|end| end + content_length(&buffer[..end]));
        if let Some(expected) = expected {
            if buffer.len() >= expected {
                return Some(buffer);
            }
        }
        if buffer.len() > MAX_REQUEST_BYTES {
            warn!("[ID{}]请求超过{}字节，拒绝处理", id, MAX_REQUEST_BYTES);
            return Some(buffer);
        }
        match stream.read(&mut chunk).await {
            Ok(0) => {
                return if buffer.is_empty() { None } else { Some(buffer) };
            }
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
            Err(e) => {
                error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
                return None;
            }
        }
    }
}

async fn handle_connection(stream: &mut TcpStream, id: u128, service: &AttendanceService) {
    let Some(buffer) = read_request(stream, id).await else {
        return;
    };
    debug!("[ID{}]HTTP请求接收完毕", id);

    let start_time = Instant::now();

    let response = if buffer.len() > MAX_REQUEST_BYTES {
        router::reject(&Exception::RequestTooLarge)
    } else {
        match Request::try_from(&buffer, id) {
            Ok(request) => {
                let response = router::handle(&request, service, id).await;
                info!(
                    "[ID{}] HTTP/{}, {}, {}, {}, {}, {}",
                    id,
                    request.version(),
                    request.path(),
                    request.method(),
                    response.status_code(),
                    response.information(),
                    request.user_agent(),
                );
                response
            }
            Err(e) => {
                error!("[ID{}]解析HTTP请求失败: {}", id, e);
                router::reject(&e)
            }
        }
    };

    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    let response_bytes = response.as_bytes();
    if let Err(e) = stream.write_all(&response_bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
}
