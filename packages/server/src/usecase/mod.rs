//! UseCase 層: 接続・メッセージ振り分け・切断のアプリケーションロジック

pub mod connect;
pub mod disconnect;
pub mod dispatch;

pub use connect::ConnectUseCase;
pub use disconnect::DisconnectUseCase;
pub use dispatch::DispatchUseCase;
